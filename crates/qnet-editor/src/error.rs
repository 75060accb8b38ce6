//! Error types for the editing engine.

use qnet_core::NodeId;
use thiserror::Error;

use crate::selection::ItemRef;
use crate::validator::ValidationError;

/// Result type alias for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors that can occur while editing a network.
///
/// Every rejected operation leaves the model exactly as it was.
#[derive(Debug, Error)]
pub enum EditorError {
    /// A node or edge referenced by id does not exist.
    #[error("{item} not found")]
    NotFound { item: ItemRef },

    /// An edge would be a self-loop or reference an unknown node.
    #[error("invalid edge {source_id} -> {target_id}: {reason}")]
    InvalidEdge {
        source_id: NodeId,
        target_id: NodeId,
        reason: String,
    },

    /// A node property failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Non-numeric input where a number was expected.
    #[error("cannot parse {input:?}: {reason}")]
    Parse { input: String, reason: String },

    /// A loaded document violates the graph invariants.
    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    /// The model reached an inconsistent state.
    #[error("model inconsistency: {message}")]
    InconsistentState { message: String },

    /// I/O error (file operations).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl EditorError {
    pub fn node_not_found(id: NodeId) -> Self {
        Self::NotFound {
            item: ItemRef::Node(id),
        }
    }

    pub fn edge_not_found(id: qnet_core::EdgeId) -> Self {
        Self::NotFound {
            item: ItemRef::Edge(id),
        }
    }

    pub fn invalid_edge(source_id: NodeId, target_id: NodeId, reason: impl Into<String>) -> Self {
        Self::InvalidEdge {
            source_id,
            target_id,
            reason: reason.into(),
        }
    }

    pub fn parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is a `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
