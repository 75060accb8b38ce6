//! Saving and loading network documents.
//!
//! Documents are pretty-printed JSON:
//!
//! ```text
//! {
//!   "nodes": [{ "id": 0, "x": 100.0, "y": 100.0, "type": "memory",
//!               "num_qubits": 1, "qubit_tech": "Color centers",
//!               "coherence_time": 1.0, "insertion_loss": 0.0 }],
//!   "edges": [{ "id": 0, "source_id": 0, "target_id": 1 }]
//! }
//! ```

use std::path::{Path, PathBuf};

use qnet_core::NetworkDocument;
use tracing::{debug, info};

use crate::error::EditorResult;

/// A network document on disk.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the document. The previous file is only replaced once the new
    /// contents are fully written.
    pub fn save(&self, document: &NetworkDocument) -> EditorResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = document.to_json_pretty()?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        info!(
            path = %self.path.display(),
            nodes = document.node_count(),
            edges = document.edge_count(),
            "Saved network document"
        );
        Ok(())
    }

    /// Read the document.
    pub fn load(&self) -> EditorResult<NetworkDocument> {
        let contents = std::fs::read_to_string(&self.path)?;
        let document = NetworkDocument::from_json(&contents)?;
        debug!(
            path = %self.path.display(),
            nodes = document.node_count(),
            edges = document.edge_count(),
            "Loaded network document"
        );
        Ok(document)
    }
}
