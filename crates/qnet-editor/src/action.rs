//! Serializable editor inputs.
//!
//! An [`EditorAction`] describes one discrete input to a session, so an
//! editing run can be written down as a JSON script and replayed from the
//! command line or a test.

use qnet_core::{NodeId, Position};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::EditorResult;
use crate::mode::{InteractionMode, PointerEvent};
use crate::selection::ItemRef;
use crate::session::EditorSession;
use crate::validator::{required_text_or_number, PropertyPatch};

/// One input to an [`EditorSession`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditorAction {
    /// Add a node at scene coordinates.
    AddNode { x: f64, y: f64 },

    /// Add a node from kilometre coordinates, given as typed text.
    AddNodeKm {
        #[serde(deserialize_with = "required_text_or_number")]
        x_km: String,
        #[serde(deserialize_with = "required_text_or_number")]
        y_km: String,
    },

    SetMode { mode: InteractionMode },

    /// Pointer press, optionally on an item.
    Press {
        x: f64,
        y: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hit: Option<ItemRef>,
    },

    Drag { x: f64, y: f64 },

    Release,

    Connect { source: NodeId, target: NodeId },

    MoveNode { id: NodeId, x: f64, y: f64 },

    /// Partial property edit; omitted fields keep their current value.
    Edit {
        id: NodeId,
        #[serde(flatten)]
        patch: PropertyPatch,
    },

    Delete { items: Vec<ItemRef> },

    DeleteSelection,

    Select { item: ItemRef },

    ClearSelection,

    Undo,

    Redo,
}

impl EditorAction {
    /// Feed this input to `session`.
    pub fn apply(&self, session: &mut EditorSession) -> EditorResult<()> {
        match self {
            EditorAction::AddNode { x, y } => {
                session.add_node_at(*x, *y)?;
            }
            EditorAction::AddNodeKm { x_km, y_km } => {
                session.add_node_at_coordinates(x_km, y_km)?;
            }
            EditorAction::SetMode { mode } => session.set_mode(*mode),
            EditorAction::Press { x, y, hit } => {
                session.pointer_press(PointerEvent {
                    position: Position::new(*x, *y),
                    hit: *hit,
                })?;
            }
            EditorAction::Drag { x, y } => {
                session.pointer_drag(Position::new(*x, *y))?;
            }
            EditorAction::Release => {
                session.pointer_release();
            }
            EditorAction::Connect { source, target } => {
                session.connect(*source, *target)?;
            }
            EditorAction::MoveNode { id, x, y } => session.move_node(*id, *x, *y)?,
            EditorAction::Edit { id, patch } => session.patch_node_properties(*id, patch)?,
            EditorAction::Delete { items } => {
                session.delete_selected(items.iter().copied());
            }
            EditorAction::DeleteSelection => {
                session.delete_selection();
            }
            EditorAction::Select { item } => session.select(*item)?,
            EditorAction::ClearSelection => session.clear_selection(),
            EditorAction::Undo => {
                session.undo()?;
            }
            EditorAction::Redo => {
                session.redo()?;
            }
        }
        Ok(())
    }
}

/// Parse a script: a JSON array of actions.
pub fn parse_script(json: &str) -> EditorResult<Vec<EditorAction>> {
    Ok(serde_json::from_str(json)?)
}

/// A step that was rejected during replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedStep {
    pub index: usize,
    pub action: EditorAction,
    pub error: String,
}

/// Outcome of [`replay`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplayReport {
    pub applied: usize,
    pub rejected: Vec<RejectedStep>,
}

impl ReplayReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Apply every action in order.
///
/// A rejected action leaves the session as it was and replay carries on with
/// the next one, the same way an interactive user keeps working after an
/// error message.
pub fn replay(session: &mut EditorSession, actions: &[EditorAction]) -> ReplayReport {
    let mut report = ReplayReport::default();
    for (index, action) in actions.iter().enumerate() {
        match action.apply(session) {
            Ok(()) => report.applied += 1,
            Err(err) => {
                warn!(step = index, error = %err, "Action rejected");
                report.rejected.push(RejectedStep {
                    index,
                    action: action.clone(),
                    error: err.to_string(),
                });
            }
        }
    }
    info!(
        applied = report.applied,
        rejected = report.rejected.len(),
        "Replay finished"
    );
    report
}
