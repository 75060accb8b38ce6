//! Interactive editing engine for quantum network topologies.
//!
//! The crate holds everything between raw user input and the saved document:
//! the graph model with its incidence bookkeeping, the interaction mode state
//! machine, the undo stack, property validation and selection handling.
//! Front ends drive an [`EditorSession`] and render from its views and
//! observer notifications.
//!
//! ## Core Concepts
//!
//! - **GraphModel**: Owns nodes and edges; every node knows its incident edges
//! - **ModeController**: Interprets pointer presses as add, connect or move
//! - **CommandStack**: Linear undo/redo history of node and edge creation
//! - **Validator**: Checks a whole property form before touching the node
//! - **EditorSession**: Ties the above together and notifies observers
//!
//! ## Invariants
//!
//! ```text
//! edge e exists  =>  e.source, e.target exist, e.source != e.target
//!                    e in incident(e.source) and e in incident(e.target)
//! remove(node)   =>  every edge in incident(node) is removed first
//! ```
//!
//! Each public operation either completes or returns an [`EditorError`] with
//! the model unchanged.

pub mod action;
pub mod command;
pub mod config;
mod error;
pub mod mode;
pub mod model;
pub mod observer;
pub mod persistence;
pub mod selection;
pub mod session;
pub mod validator;

pub use action::{parse_script, replay, EditorAction, RejectedStep, ReplayReport};
pub use command::{AddEdgeCommand, AddNodeCommand, Command, CommandStack};
pub use config::EditorConfig;
pub use error::{EditorError, EditorResult};
pub use mode::{InteractionMode, ModeAction, ModeController, PointerEvent};
pub use model::{Edge, EdgeGeometry, GraphModel, ModelEvent, Node, RemovedNode};
pub use observer::{EditorObserver, ObserverLog, RecordingObserver};
pub use persistence::DocumentStore;
pub use selection::{delete_items, DeletionReport, ItemRef, Selection};
pub use session::{EdgeView, EditorKey, EditorSession, NodeView};
pub use validator::{validate, CandidateFields, PropertyField, PropertyPatch, ValidationError};

// Re-export the shared domain types so front ends need only one import.
pub use qnet_core::{
    EdgeId, EdgeRecord, FillColor, NetworkDocument, NodeAttributes, NodeId, NodeRecord,
    NodeType, Position, QubitTech, TopologySummary,
};
