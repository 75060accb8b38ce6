//! The editing session: the single entry point a front end talks to.
//!
//! A session owns the model, the mode controller, the undo stack and the
//! selection. Each method handles one discrete input and runs to completion;
//! afterwards the buffered model events are handed to every subscribed
//! observer.

use std::fmt;

use qnet_core::{
    EdgeId, FillColor, NetworkDocument, NodeAttributes, NodeId, NodeType, Position,
    SCENE_UNITS_PER_KM,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::command::{AddEdgeCommand, AddNodeCommand, CommandStack};
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::mode::{InteractionMode, ModeAction, ModeController, PointerEvent};
use crate::model::{check_position, GraphModel};
use crate::observer::EditorObserver;
use crate::selection::{delete_items, DeletionReport, ItemRef, Selection};
use crate::validator::{self, CandidateFields, PropertyPatch};

const STATUS_PICK_SECOND: &str = "Select the second node to connect.";
const STATUS_CONNECTED: &str = "Nodes connected.";

/// Render-ready view of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub radius: f64,
    pub fill: FillColor,
    pub selected: bool,
}

/// Render-ready view of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeView {
    pub id: EdgeId,
    pub source: Position,
    pub target: Position,
    pub selected: bool,
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Delete,
    Undo,
    Redo,
    /// A plain character; mode shortcuts are `A`, `C` and `M`.
    Char(char),
}

/// Interactive editing session over one network.
pub struct EditorSession {
    model: GraphModel,
    controller: ModeController,
    stack: CommandStack,
    selection: Selection,
    observers: Vec<Box<dyn EditorObserver>>,
    config: EditorConfig,
}

impl fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorSession")
            .field("model", &self.model)
            .field("controller", &self.controller)
            .field("stack", &self.stack)
            .field("selection", &self.selection)
            .field("observers", &self.observers.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    /// Start with an empty network.
    pub fn new(config: EditorConfig) -> Self {
        Self {
            model: GraphModel::new(),
            controller: ModeController::new(),
            stack: CommandStack::with_limit(config.undo_limit),
            selection: Selection::new(),
            observers: Vec::new(),
            config,
        }
    }

    /// Start from a saved document.
    pub fn from_document(document: &NetworkDocument, config: EditorConfig) -> EditorResult<Self> {
        let mut session = Self::new(config);
        session.load_document(document)?;
        Ok(session)
    }

    /// Replace the whole network. On error the session is unchanged.
    ///
    /// Undo history, selection and any pending connect source are discarded.
    pub fn load_document(&mut self, document: &NetworkDocument) -> EditorResult<()> {
        self.model = GraphModel::from_document(document)?;
        self.stack.clear();
        self.selection.clear();
        self.controller.prune(&self.model);
        debug!(
            nodes = self.model.node_count(),
            edges = self.model.edge_count(),
            "Loaded document into session"
        );
        Ok(())
    }

    pub fn document(&self) -> NetworkDocument {
        self.model.to_document()
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn commands(&self) -> &CommandStack {
        &self.stack
    }

    /// Register an observer for status hints and model events.
    pub fn subscribe(&mut self, observer: Box<dyn EditorObserver>) {
        self.observers.push(observer);
    }

    // =========================================================================
    // Modes and pointer input
    // =========================================================================

    pub fn mode(&self) -> InteractionMode {
        self.controller.mode()
    }

    pub fn pending_source(&self) -> Option<NodeId> {
        self.controller.pending_source()
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.controller.set_mode(mode);
    }

    /// Handle a pointer press in the current mode.
    ///
    /// Pressing an item also makes it the only selected item; pressing empty
    /// space clears the selection. A press at a non-finite position is
    /// rejected before selection or mode state changes.
    pub fn pointer_press(&mut self, event: PointerEvent) -> EditorResult<ModeAction> {
        check_position(event.position)?;
        self.selection.clear();
        if let Some(item) = event.hit.filter(|item| self.item_exists(*item)) {
            self.selection.select(item);
        }

        let action = self.controller.press(&self.model, event);
        let result = self.perform(action);
        self.flush();
        result.map(|_| action)
    }

    /// Handle pointer motion while the button is held.
    pub fn pointer_drag(&mut self, position: Position) -> EditorResult<ModeAction> {
        check_position(position)?;
        let action = self.controller.drag(&self.model, position);
        let result = self.perform(action);
        self.flush();
        result.map(|_| action)
    }

    /// Handle the pointer button being released.
    pub fn pointer_release(&mut self) -> ModeAction {
        let action = self.controller.release();
        if let ModeAction::EndDrag(id) = action {
            debug!(node = %id, "Drag finished");
        }
        action
    }

    /// Handle a key press.
    pub fn key_press(&mut self, key: EditorKey) -> EditorResult<()> {
        match key {
            EditorKey::Delete => {
                self.delete_selection();
            }
            EditorKey::Undo => {
                self.undo()?;
            }
            EditorKey::Redo => {
                self.redo()?;
            }
            EditorKey::Char(c) => {
                if let Some(mode) = InteractionMode::from_shortcut(c) {
                    self.set_mode(mode);
                }
            }
        }
        Ok(())
    }

    fn perform(&mut self, action: ModeAction) -> EditorResult<()> {
        match action {
            ModeAction::Nothing | ModeAction::ConnectCancelled | ModeAction::EndDrag(_) => {}
            ModeAction::AddNode(position) => {
                self.push_add_node(position, None)?;
            }
            ModeAction::SourceSelected(_) => self.status(STATUS_PICK_SECOND),
            ModeAction::Connect { source, target } => {
                self.push_add_edge(source, target)?;
                self.status(STATUS_CONNECTED);
            }
            ModeAction::BeginDrag(id) => debug!(node = %id, "Drag started"),
            ModeAction::MoveNode { id, position } => {
                self.model.set_node_position(id, position)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Programmatic edits
    // =========================================================================

    /// Add a node with default attributes at a scene position.
    pub fn add_node_at(&mut self, x: f64, y: f64) -> EditorResult<NodeId> {
        self.add_node_with(Position::new(x, y), None)
    }

    /// Add a node with the given attributes.
    pub fn add_node_with(
        &mut self,
        position: Position,
        attributes: Option<NodeAttributes>,
    ) -> EditorResult<NodeId> {
        let result = self.push_add_node(position, attributes);
        self.flush();
        result
    }

    /// Add a node from kilometre coordinates typed by the user.
    ///
    /// One kilometre is always [`SCENE_UNITS_PER_KM`] scene units. Non-numeric
    /// input is rejected before anything changes.
    pub fn add_node_at_coordinates(&mut self, x_km: &str, y_km: &str) -> EditorResult<NodeId> {
        let x = parse_coordinate(x_km)?;
        let y = parse_coordinate(y_km)?;
        let position = Position::from_km(x, y, SCENE_UNITS_PER_KM);

        let id = self.add_node_with(position, None)?;
        self.status(&format!("Node added at {}.", position));
        Ok(id)
    }

    /// Link two nodes, as two clicks in connect mode would.
    pub fn connect(&mut self, source: NodeId, target: NodeId) -> EditorResult<EdgeId> {
        let result = self.push_add_edge(source, target);
        if result.is_ok() {
            self.status(STATUS_CONNECTED);
        }
        self.flush();
        result
    }

    /// Move a node to a new scene position. Not undoable.
    pub fn move_node(&mut self, id: NodeId, x: f64, y: f64) -> EditorResult<()> {
        let result = self.model.set_node_position(id, Position::new(x, y));
        self.flush();
        result
    }

    /// Delete a batch of items; nodes take their incident edges with them.
    /// Not undoable.
    pub fn delete_selected<I>(&mut self, items: I) -> DeletionReport
    where
        I: IntoIterator<Item = ItemRef>,
    {
        let report = delete_items(&mut self.model, items);
        for id in &report.nodes {
            self.controller.forget_node(*id);
        }
        self.selection.retain_existing(&self.model);
        self.flush();
        report
    }

    /// Delete whatever is currently selected.
    pub fn delete_selection(&mut self) -> DeletionReport {
        let items: Vec<ItemRef> = self.selection.iter().collect();
        self.delete_selected(items)
    }

    /// Validate and apply a full property form. Not undoable.
    pub fn edit_node_properties(
        &mut self,
        id: NodeId,
        candidate: &CandidateFields,
    ) -> EditorResult<()> {
        let result = validator::commit(&mut self.model, id, candidate).map(|_| ());
        self.flush();
        result
    }

    /// Apply a partial property edit on top of the node's current values.
    pub fn patch_node_properties(&mut self, id: NodeId, patch: &PropertyPatch) -> EditorResult<()> {
        let current = self
            .model
            .node(id)
            .map(|n| CandidateFields::from_attributes(n.attributes()))
            .ok_or_else(|| EditorError::node_not_found(id))?;
        self.edit_node_properties(id, &patch.apply_to(current))
    }

    pub fn undo(&mut self) -> EditorResult<bool> {
        let result = self.stack.undo(&mut self.model);
        self.after_history_change();
        result
    }

    pub fn redo(&mut self) -> EditorResult<bool> {
        let result = self.stack.redo(&mut self.model);
        self.after_history_change();
        result
    }

    fn after_history_change(&mut self) {
        self.controller.prune(&self.model);
        self.selection.retain_existing(&self.model);
        self.flush();
    }

    fn push_add_node(
        &mut self,
        position: Position,
        attributes: Option<NodeAttributes>,
    ) -> EditorResult<NodeId> {
        let command = Box::new(AddNodeCommand::new(position, attributes));
        match self.stack.push(command, &mut self.model)? {
            Some(ItemRef::Node(id)) => Ok(id),
            other => Err(EditorError::InconsistentState {
                message: format!("add node produced {:?}", other),
            }),
        }
    }

    fn push_add_edge(&mut self, source: NodeId, target: NodeId) -> EditorResult<EdgeId> {
        let command = Box::new(AddEdgeCommand::new(source, target));
        match self.stack.push(command, &mut self.model) {
            Ok(Some(ItemRef::Edge(id))) => Ok(id),
            Ok(other) => Err(EditorError::InconsistentState {
                message: format!("add edge produced {:?}", other),
            }),
            Err(err) => {
                warn!(%source, %target, error = %err, "Rejected edge");
                Err(err)
            }
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Add an existing item to the selection.
    pub fn select(&mut self, item: ItemRef) -> EditorResult<()> {
        if !self.item_exists(item) {
            return Err(EditorError::NotFound { item });
        }
        self.selection.select(item);
        Ok(())
    }

    pub fn toggle_selection(&mut self, item: ItemRef) -> EditorResult<bool> {
        if !self.item_exists(item) {
            return Err(EditorError::NotFound { item });
        }
        Ok(self.selection.toggle(item))
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn item_exists(&self, item: ItemRef) -> bool {
        match item {
            ItemRef::Node(id) => self.model.contains_node(id),
            ItemRef::Edge(id) => self.model.contains_edge(id),
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn node_view(&self, id: NodeId) -> Option<NodeView> {
        self.model.node(id).map(|node| NodeView {
            id,
            x: node.position().x,
            y: node.position().y,
            node_type: node.attributes().node_type,
            radius: self.config.node_radius,
            fill: node.fill_color(),
            selected: self.selection.contains(id),
        })
    }

    pub fn node_views(&self) -> Vec<NodeView> {
        self.model
            .nodes()
            .filter_map(|n| self.node_view(n.id()))
            .collect()
    }

    pub fn edge_view(&self, id: EdgeId) -> Option<EdgeView> {
        self.model.edge_geometry(id).map(|geometry| EdgeView {
            id,
            source: geometry.source,
            target: geometry.target,
            selected: self.selection.contains(id),
        })
    }

    pub fn edge_views(&self) -> Vec<EdgeView> {
        self.model
            .edges()
            .filter_map(|e| self.edge_view(e.id()))
            .collect()
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    fn status(&mut self, message: &str) {
        debug!(status = message);
        for observer in &mut self.observers {
            observer.on_status(message);
        }
    }

    fn flush(&mut self) {
        let events = self.model.take_events();
        if self.observers.is_empty() {
            return;
        }
        for event in &events {
            for observer in &mut self.observers {
                observer.on_model_event(event);
            }
        }
    }
}

fn parse_coordinate(input: &str) -> EditorResult<f64> {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        Ok(_) => Err(EditorError::parse(input, "coordinate must be finite")),
        Err(_) => Err(EditorError::parse(input, "coordinates must be numeric")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::RecordingObserver;

    #[test]
    fn test_add_node_at_coordinates_scales() {
        let mut session = EditorSession::default();
        let id = session.add_node_at_coordinates("5", "5").unwrap();

        let view = session.node_view(id).unwrap();
        assert_eq!((view.x, view.y), (50.0, 50.0));
        assert_eq!(view.radius, 30.0);
        assert_eq!(view.fill, FillColor::Yellow);
    }

    #[test]
    fn test_add_node_at_coordinates_rejects_text() {
        let mut session = EditorSession::default();
        let err = session.add_node_at_coordinates("five", "5").unwrap_err();
        assert!(matches!(err, EditorError::Parse { .. }));
        let err = session.add_node_at_coordinates("5", "inf").unwrap_err();
        assert!(matches!(err, EditorError::Parse { .. }));
        assert_eq!(session.model().node_count(), 0);
        assert!(!session.commands().can_undo());
    }

    #[test]
    fn test_non_finite_positions_are_rejected() {
        let mut session = EditorSession::default();
        let a = session.add_node_at(1.0, 2.0).unwrap();
        session.select(ItemRef::Node(a)).unwrap();

        let err = session.add_node_at(f64::INFINITY, 0.0).unwrap_err();
        assert!(matches!(err, EditorError::Parse { .. }));
        let err = session.move_node(a, f64::NAN, 2.0).unwrap_err();
        assert!(matches!(err, EditorError::Parse { .. }));

        let err = session
            .pointer_press(PointerEvent::at(f64::NEG_INFINITY, 0.0))
            .unwrap_err();
        assert!(matches!(err, EditorError::Parse { .. }));
        assert!(session.selection().contains(a));

        session.set_mode(InteractionMode::Move);
        session.pointer_press(PointerEvent::on(1.0, 2.0, a)).unwrap();
        assert!(session
            .pointer_drag(Position::new(f64::NAN, f64::NAN))
            .is_err());
        session.pointer_release();

        assert_eq!(session.model().node_count(), 1);
        assert_eq!(session.commands().len(), 1);
        let view = session.node_view(a).unwrap();
        assert_eq!((view.x, view.y), (1.0, 2.0));

        let json = session.document().to_json_pretty().unwrap();
        assert!(NetworkDocument::from_json(&json).is_ok());
    }

    #[test]
    fn test_status_hints_reach_observers() {
        let mut session = EditorSession::default();
        let recorder = RecordingObserver::new();
        session.subscribe(Box::new(recorder.clone()));

        let a = session.add_node_at(100.0, 100.0).unwrap();
        let b = session.add_node_at(200.0, 100.0).unwrap();
        session.set_mode(InteractionMode::Connect);
        session
            .pointer_press(PointerEvent::on(100.0, 100.0, a))
            .unwrap();
        assert_eq!(recorder.last_status().as_deref(), Some(STATUS_PICK_SECOND));

        session
            .pointer_press(PointerEvent::on(200.0, 100.0, b))
            .unwrap();
        assert_eq!(recorder.last_status().as_deref(), Some(STATUS_CONNECTED));
        assert!(recorder
            .events()
            .iter()
            .any(|e| matches!(e, crate::model::ModelEvent::EdgeAdded { .. })));
    }

    #[test]
    fn test_press_selects_hit_item() {
        let mut session = EditorSession::default();
        let a = session.add_node_at(0.0, 0.0).unwrap();
        session.set_mode(InteractionMode::Move);

        session.pointer_press(PointerEvent::on(0.0, 0.0, a)).unwrap();
        assert!(session.selection().contains(a));
        assert!(session.node_view(a).unwrap().selected);

        session.pointer_press(PointerEvent::at(50.0, 50.0)).unwrap();
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_delete_key_removes_selection() {
        let mut session = EditorSession::default();
        let a = session.add_node_at(0.0, 0.0).unwrap();
        let b = session.add_node_at(10.0, 0.0).unwrap();
        let e = session.connect(a, b).unwrap();

        session.select(ItemRef::Edge(e)).unwrap();
        assert!(session.edge_view(e).unwrap().selected);
        session.key_press(EditorKey::Delete).unwrap();

        assert_eq!(session.model().edge_count(), 0);
        assert_eq!(session.model().node_count(), 2);
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_mode_shortcut_keys() {
        let mut session = EditorSession::default();
        session.key_press(EditorKey::Char('c')).unwrap();
        assert_eq!(session.mode(), InteractionMode::Connect);
        session.key_press(EditorKey::Char('m')).unwrap();
        assert_eq!(session.mode(), InteractionMode::Move);
        session.key_press(EditorKey::Char('x')).unwrap();
        assert_eq!(session.mode(), InteractionMode::Move);
    }

    #[test]
    fn test_deleting_pending_source_clears_it() {
        let mut session = EditorSession::default();
        let a = session.add_node_at(0.0, 0.0).unwrap();
        session.set_mode(InteractionMode::Connect);
        session.pointer_press(PointerEvent::on(0.0, 0.0, a)).unwrap();
        assert_eq!(session.pending_source(), Some(a));

        session.delete_selected([ItemRef::Node(a)]);
        assert_eq!(session.pending_source(), None);
    }

    #[test]
    fn test_undo_clears_pending_source_of_removed_node() {
        let mut session = EditorSession::default();
        let a = session.add_node_at(0.0, 0.0).unwrap();
        session.set_mode(InteractionMode::Connect);
        session.pointer_press(PointerEvent::on(0.0, 0.0, a)).unwrap();

        assert!(session.undo().unwrap());
        assert_eq!(session.pending_source(), None);
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_patch_properties() {
        let mut session = EditorSession::default();
        let a = session.add_node_at(0.0, 0.0).unwrap();
        let patch = PropertyPatch {
            node_type: Some(NodeType::Detector),
            num_qubits: Some("8".to_string()),
            ..PropertyPatch::default()
        };
        session.patch_node_properties(a, &patch).unwrap();

        let node = session.model().node(a).unwrap();
        assert_eq!(node.attributes().num_qubits, 8);
        assert_eq!(session.node_view(a).unwrap().fill, FillColor::LightBlue);

        let err = session
            .patch_node_properties(NodeId(99), &patch)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_document_failure_keeps_session() {
        let mut session = EditorSession::default();
        session.add_node_at(0.0, 0.0).unwrap();
        let mut bad = session.document();
        bad.nodes.push(bad.nodes[0].clone());

        assert!(session.load_document(&bad).is_err());
        assert_eq!(session.model().node_count(), 1);
        assert!(session.commands().can_undo());
    }
}
