//! Config command implementation.
//!
//! Manages editor configuration.

use anyhow::Result;
use qnet_editor::EditorConfig;

use crate::ConfigCommands;

/// Run a `qnet config` subcommand.
///
/// Only the stored file is required to parse. Broken `QNET_*` overrides are
/// reported but never block inspecting or repairing the configuration.
pub fn execute(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(&effective()?),
        ConfigCommands::Set { key, value } => set(&mut EditorConfig::load_file()?, &key, &value),
        ConfigCommands::Get { key } => get(&effective()?, &key),
        ConfigCommands::Reset => reset(),
        ConfigCommands::Path => path(),
    }
}

/// Stored configuration with whichever environment overrides apply cleanly.
fn effective() -> Result<EditorConfig> {
    let stored = EditorConfig::load_file()?;
    let mut config = stored.clone();
    match config.apply_env() {
        Ok(()) => Ok(config),
        Err(e) => {
            eprintln!("⚠️  Ignoring environment overrides: {}", e);
            Ok(stored)
        }
    }
}

/// Show current configuration.
pub fn show(config: &EditorConfig) -> Result<()> {
    println!("qnet Configuration");
    println!("{:-<40}", "");

    println!("Node Radius:       {}", config.node_radius);
    println!(
        "Undo Limit:        {}",
        config
            .undo_limit
            .map(|l| l.to_string())
            .unwrap_or_else(|| "(unlimited)".to_string())
    );
    println!("Default Document:  {}", config.default_document.display());

    if let Some(config_path) = EditorConfig::config_file_path() {
        println!("\nConfig file: {}", config_path.display());
    }

    Ok(())
}

/// Set a configuration value and save it.
pub fn set(config: &mut EditorConfig, key: &str, value: &str) -> Result<()> {
    let key = normalize_key(key);
    config.set(&key, value).map_err(|e| {
        anyhow::anyhow!(
            "{}. Valid keys: {}",
            e,
            EditorConfig::keys().join(", ")
        )
    })?;
    config.save()?;

    if let Some(value) = config.get(&key) {
        println!("Set {} to: {}", key, value);
    }
    Ok(())
}

/// Get a configuration value.
pub fn get(config: &EditorConfig, key: &str) -> Result<()> {
    match config.get(&normalize_key(key)) {
        Some(value) => println!("{}", value),
        None => anyhow::bail!("Unknown config key: {}", key),
    }
    Ok(())
}

/// Reset configuration to defaults.
pub fn reset() -> Result<()> {
    EditorConfig::default().save()?;
    println!("Configuration reset to defaults");
    Ok(())
}

/// Print where the configuration file lives.
pub fn path() -> Result<()> {
    match EditorConfig::config_file_path() {
        Some(path) => println!("{}", path.display()),
        None => anyhow::bail!("No configuration directory available on this platform"),
    }
    Ok(())
}

/// Accept `node-radius` as well as `node_radius`.
fn normalize_key(key: &str) -> String {
    key.trim().replace('-', "_")
}
