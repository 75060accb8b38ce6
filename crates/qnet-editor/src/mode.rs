//! Interaction modes: how pointer input is turned into edits.
//!
//! The controller only decides; it never mutates the model itself. Each
//! handled event yields a [`ModeAction`] that the session carries out.

use std::fmt;
use std::str::FromStr;

use qnet_core::{NodeId, Position};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EditorError;
use crate::model::GraphModel;
use crate::selection::ItemRef;

/// Current interpretation of pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Every press places a new node.
    #[default]
    AddNode,
    /// Two presses on distinct nodes link them.
    Connect,
    /// Nodes follow the pointer while dragged.
    Move,
}

impl InteractionMode {
    pub fn label(&self) -> &'static str {
        match self {
            InteractionMode::AddNode => "add_node",
            InteractionMode::Connect => "connect",
            InteractionMode::Move => "move",
        }
    }

    /// Keyboard shortcut that selects this mode.
    pub fn shortcut(&self) -> char {
        match self {
            InteractionMode::AddNode => 'A',
            InteractionMode::Connect => 'C',
            InteractionMode::Move => 'M',
        }
    }

    pub fn from_shortcut(key: char) -> Option<Self> {
        match key.to_ascii_uppercase() {
            'A' => Some(InteractionMode::AddNode),
            'C' => Some(InteractionMode::Connect),
            'M' => Some(InteractionMode::Move),
            _ => None,
        }
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InteractionMode {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "add_node" | "add" => Ok(InteractionMode::AddNode),
            "connect" => Ok(InteractionMode::Connect),
            "move" => Ok(InteractionMode::Move),
            _ => Err(EditorError::parse(s, "expected add_node, connect or move")),
        }
    }
}

/// A pointer event in scene coordinates with the item under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub position: Position,
    #[serde(default)]
    pub hit: Option<ItemRef>,
}

impl PointerEvent {
    /// A press on empty space.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Position::new(x, y),
            hit: None,
        }
    }

    /// A press on an item.
    pub fn on(x: f64, y: f64, item: impl Into<ItemRef>) -> Self {
        Self {
            position: Position::new(x, y),
            hit: Some(item.into()),
        }
    }
}

/// What the session should do in response to an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModeAction {
    Nothing,
    AddNode(Position),
    SourceSelected(NodeId),
    Connect { source: NodeId, target: NodeId },
    ConnectCancelled,
    BeginDrag(NodeId),
    MoveNode { id: NodeId, position: Position },
    EndDrag(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    node: NodeId,
    grab_offset: Position,
}

/// State machine over [`InteractionMode`].
///
/// In `Connect` mode `pending_source` is either empty (awaiting the first
/// node) or holds one node that existed when it was chosen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModeController {
    mode: InteractionMode,
    pending_source: Option<NodeId>,
    drag: Option<DragState>,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Node chosen as the first endpoint in `Connect` mode.
    pub fn pending_source(&self) -> Option<NodeId> {
        self.pending_source
    }

    pub fn dragging(&self) -> Option<NodeId> {
        self.drag.map(|d| d.node)
    }

    /// Switch modes. Any pending connect source or drag is discarded.
    pub fn set_mode(&mut self, mode: InteractionMode) {
        debug!(from = %self.mode, to = %mode, "Mode change");
        self.mode = mode;
        self.pending_source = None;
        self.drag = None;
    }

    /// Handle a pointer press.
    pub fn press(&mut self, model: &GraphModel, event: PointerEvent) -> ModeAction {
        let hit_node = match event.hit {
            Some(ItemRef::Node(id)) if model.contains_node(id) => Some(id),
            _ => None,
        };

        match self.mode {
            InteractionMode::AddNode => ModeAction::AddNode(event.position),
            InteractionMode::Connect => {
                let pending = self.pending_source.filter(|id| model.contains_node(*id));
                self.pending_source = None;

                match (pending, hit_node) {
                    (None, Some(node)) => {
                        self.pending_source = Some(node);
                        ModeAction::SourceSelected(node)
                    }
                    (None, None) => ModeAction::Nothing,
                    (Some(source), Some(target)) if source != target => {
                        ModeAction::Connect { source, target }
                    }
                    (Some(_), _) => ModeAction::ConnectCancelled,
                }
            }
            InteractionMode::Move => match hit_node.and_then(|id| model.node(id)) {
                Some(node) => {
                    self.drag = Some(DragState {
                        node: node.id(),
                        grab_offset: node.position().offset_from(event.position),
                    });
                    ModeAction::BeginDrag(node.id())
                }
                None => ModeAction::Nothing,
            },
        }
    }

    /// Handle pointer motion with the button held.
    pub fn drag(&mut self, model: &GraphModel, position: Position) -> ModeAction {
        match self.drag {
            Some(drag) if self.mode == InteractionMode::Move && model.contains_node(drag.node) => {
                ModeAction::MoveNode {
                    id: drag.node,
                    position: position.translated(drag.grab_offset),
                }
            }
            Some(_) => {
                self.drag = None;
                ModeAction::Nothing
            }
            None => ModeAction::Nothing,
        }
    }

    /// Handle the pointer button being released.
    pub fn release(&mut self) -> ModeAction {
        match self.drag.take() {
            Some(drag) => ModeAction::EndDrag(drag.node),
            None => ModeAction::Nothing,
        }
    }

    /// Forget any reference to a node that has left the model.
    pub fn forget_node(&mut self, id: NodeId) {
        if self.pending_source == Some(id) {
            self.pending_source = None;
        }
        if self.drag.is_some_and(|d| d.node == id) {
            self.drag = None;
        }
    }

    /// Drop references to every node the model no longer holds.
    pub fn prune(&mut self, model: &GraphModel) {
        if let Some(id) = self.pending_source {
            if !model.contains_node(id) {
                self.forget_node(id);
            }
        }
        if let Some(id) = self.dragging() {
            if !model.contains_node(id) {
                self.forget_node(id);
            }
        }
    }
}
