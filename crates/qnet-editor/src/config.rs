//! Editor configuration.

use std::path::PathBuf;

use directories::ProjectDirs;
use qnet_core::DEFAULT_NODE_RADIUS;
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};

/// Tunables for an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Radius (scene units) reported for every node view.
    #[serde(default = "default_node_radius")]
    pub node_radius: f64,

    /// Maximum number of undo steps kept; unlimited when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undo_limit: Option<usize>,

    /// Document used when no path is given.
    #[serde(default = "default_document")]
    pub default_document: PathBuf,
}

fn default_node_radius() -> f64 {
    DEFAULT_NODE_RADIUS
}

fn default_document() -> PathBuf {
    PathBuf::from("network.json")
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            node_radius: default_node_radius(),
            undo_limit: None,
            default_document: default_document(),
        }
    }
}

impl EditorConfig {
    /// Load configuration from disk with environment overrides.
    pub fn load() -> EditorResult<Self> {
        let mut config = Self::load_file()?;
        config.apply_env()?;
        Ok(config)
    }

    /// Load only what is stored on disk, ignoring the environment.
    pub fn load_file() -> EditorResult<Self> {
        match Self::config_file_path() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)?;
                Ok(serde_json::from_str(&contents)?)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Apply `QNET_*` environment variable overrides.
    pub fn apply_env(&mut self) -> EditorResult<()> {
        for (var, key) in [
            ("QNET_NODE_RADIUS", "node_radius"),
            ("QNET_UNDO_LIMIT", "undo_limit"),
            ("QNET_DEFAULT_DOCUMENT", "default_document"),
        ] {
            if let Ok(value) = std::env::var(var) {
                self.set(key, &value)
                    .map_err(|e| EditorError::Config(format!("{}: {}", var, e)))?;
            }
        }
        Ok(())
    }

    /// Save configuration to disk.
    pub fn save(&self) -> EditorResult<()> {
        if let Some(path) = Self::config_file_path() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(self)?;
            std::fs::write(&path, contents)?;
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_file_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "qnet", "qnet-designer")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "node_radius" => Some(self.node_radius.to_string()),
            "undo_limit" => Some(
                self.undo_limit
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "unlimited".to_string()),
            ),
            "default_document" => Some(self.default_document.display().to_string()),
            _ => None,
        }
    }

    /// Set a configuration value by key.
    pub fn set(&mut self, key: &str, value: &str) -> EditorResult<()> {
        match key {
            "node_radius" => self.node_radius = parse_positive(value)?,
            "undo_limit" => {
                self.undo_limit = match value.trim() {
                    "" | "unlimited" | "none" => None,
                    other => Some(other.parse().map_err(|_| {
                        EditorError::Config(format!("Invalid undo limit: {}", value))
                    })?),
                };
            }
            "default_document" => self.default_document = PathBuf::from(value),
            _ => {
                return Err(EditorError::Config(format!("Unknown config key: {}", key)));
            }
        }
        Ok(())
    }

    /// Every known key, in display order.
    pub fn keys() -> &'static [&'static str] {
        &["node_radius", "undo_limit", "default_document"]
    }
}

fn parse_positive(value: &str) -> EditorResult<f64> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(EditorError::Config(format!(
            "Invalid positive number: {}",
            value
        ))),
    }
}
