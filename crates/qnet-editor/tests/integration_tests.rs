//! End-to-end editing scenarios driven through the public session API.

use qnet_editor::{
    CandidateFields, DocumentStore, EditorConfig, EditorError, EditorKey, EditorSession,
    InteractionMode, ItemRef, ModeAction, ModelEvent, NodeId, NodeType, PointerEvent, Position,
    PropertyField, QubitTech, RecordingObserver, ValidationError,
};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

/// A ring of `n` nodes plus one chord, built through the session.
fn ring_with_chord(session: &mut EditorSession, n: usize) -> Vec<NodeId> {
    let ids: Vec<NodeId> = (0..n)
        .map(|i| session.add_node_at(i as f64 * 50.0, (i % 2) as f64 * 40.0).unwrap())
        .collect();
    for i in 0..n {
        session.connect(ids[i], ids[(i + 1) % n]).unwrap();
    }
    session.connect(ids[0], ids[n / 2]).unwrap();
    ids
}

fn candidate(node_type: NodeType, qubits: &str, coherence: &str, loss: &str) -> CandidateFields {
    CandidateFields {
        node_type,
        num_qubits: qubits.to_string(),
        qubit_tech: QubitTech::Atoms,
        coherence_time: coherence.to_string(),
        insertion_loss: loss.to_string(),
    }
}

// ============================================================================
// Graph Invariants
// ============================================================================

#[test]
fn test_every_edge_is_registered_at_both_endpoints() {
    let mut session = EditorSession::default();
    ring_with_chord(&mut session, 6);

    let model = session.model();
    for edge in model.edges() {
        let source = model.node(edge.source()).unwrap();
        let target = model.node(edge.target()).unwrap();
        assert!(source.incident_edges().any(|e| e == edge.id()));
        assert!(target.incident_edges().any(|e| e == edge.id()));
    }
    model.verify_integrity().unwrap();
}

#[test]
fn test_cascade_removes_exactly_incident_edges() {
    let mut session = EditorSession::default();
    let ids = ring_with_chord(&mut session, 6);
    let hub = ids[0];

    let before = session.model().edge_count();
    let degree = session.model().node(hub).unwrap().degree();
    assert_eq!(degree, 3);

    let report = session.delete_selected([ItemRef::Node(hub)]);
    assert_eq!(report.nodes, vec![hub]);
    assert_eq!(report.edges.len(), degree);
    assert_eq!(session.model().edge_count(), before - degree);
    assert!(session.model().edges().all(|e| !e.touches(hub)));
    session.model().verify_integrity().unwrap();
}

#[test]
fn test_deleting_node_and_its_edge_together() {
    let mut session = EditorSession::default();
    let a = session.add_node_at(0.0, 0.0).unwrap();
    let b = session.add_node_at(10.0, 0.0).unwrap();
    let e = session.connect(a, b).unwrap();

    let report = session.delete_selected([ItemRef::Edge(e), ItemRef::Node(a)]);
    assert_eq!(report.nodes, vec![a]);
    assert_eq!(report.edges, vec![e]);
    assert_eq!(session.model().node(b).unwrap().degree(), 0);
}

#[test]
fn test_self_loop_rejected_without_change() {
    let mut session = EditorSession::default();
    let a = session.add_node_at(0.0, 0.0).unwrap();

    let err = session.connect(a, a).unwrap_err();
    assert!(matches!(err, EditorError::InvalidEdge { .. }));
    assert_eq!(session.model().edge_count(), 0);
    assert_eq!(session.commands().len(), 1);
}

#[test]
fn test_parallel_edges_are_distinct() {
    let mut session = EditorSession::default();
    let a = session.add_node_at(0.0, 0.0).unwrap();
    let b = session.add_node_at(10.0, 0.0).unwrap();

    let first = session.connect(a, b).unwrap();
    let second = session.connect(b, a).unwrap();
    assert_ne!(first, second);
    assert_eq!(session.model().node(a).unwrap().degree(), 2);
}

// ============================================================================
// Modes
// ============================================================================

#[test]
fn test_mode_switch_always_clears_pending_source() {
    let mut session = EditorSession::default();
    let a = session.add_node_at(0.0, 0.0).unwrap();

    for next in [
        InteractionMode::AddNode,
        InteractionMode::Connect,
        InteractionMode::Move,
    ] {
        session.set_mode(InteractionMode::Connect);
        session.pointer_press(PointerEvent::on(0.0, 0.0, a)).unwrap();
        assert_eq!(session.pending_source(), Some(a));

        session.set_mode(next);
        assert_eq!(session.mode(), next);
        assert_eq!(session.pending_source(), None);
    }
}

#[test]
fn test_connect_cancelled_by_same_node_or_empty_space() -> anyhow::Result<()> {
    let mut session = EditorSession::default();
    let a = session.add_node_at(0.0, 0.0)?;
    session.set_mode(InteractionMode::Connect);

    session.pointer_press(PointerEvent::on(0.0, 0.0, a))?;
    let action = session.pointer_press(PointerEvent::on(0.0, 0.0, a))?;
    assert_eq!(action, ModeAction::ConnectCancelled);

    session.pointer_press(PointerEvent::on(0.0, 0.0, a))?;
    let action = session.pointer_press(PointerEvent::at(300.0, 300.0))?;
    assert_eq!(action, ModeAction::ConnectCancelled);

    assert_eq!(session.model().edge_count(), 0);
    assert_eq!(session.pending_source(), None);
    Ok(())
}

#[test]
fn test_move_updates_all_incident_geometry() {
    let mut session = EditorSession::default();
    let ids = ring_with_chord(&mut session, 4);
    let hub = ids[0];
    let recorder = RecordingObserver::new();
    session.subscribe(Box::new(recorder.clone()));

    session.set_mode(InteractionMode::Move);
    session.pointer_press(PointerEvent::on(0.0, 0.0, hub)).unwrap();
    session.pointer_drag(Position::new(500.0, 250.0)).unwrap();
    assert!(matches!(session.pointer_release(), ModeAction::EndDrag(id) if id == hub));

    let target = session.model().node(hub).unwrap().position();
    assert_eq!(target, Position::new(500.0, 250.0));

    let incident: Vec<_> = session.model().node(hub).unwrap().incident_edges().collect();
    for edge_id in &incident {
        let view = session.edge_view(*edge_id).unwrap();
        assert!(view.source == target || view.target == target);
    }

    let geometry_events = recorder
        .events()
        .into_iter()
        .filter(|e| matches!(e, ModelEvent::EdgeGeometryChanged { .. }))
        .count();
    assert_eq!(geometry_events, incident.len());
}

#[test]
fn test_move_keeps_grab_offset() {
    let mut session = EditorSession::default();
    let a = session.add_node_at(100.0, 100.0).unwrap();
    session.key_press(EditorKey::Char('M')).unwrap();

    session.pointer_press(PointerEvent::on(110.0, 95.0, a)).unwrap();
    session.pointer_drag(Position::new(210.0, 195.0)).unwrap();
    session.pointer_release();

    assert_eq!(
        session.model().node(a).unwrap().position(),
        Position::new(200.0, 200.0)
    );
}

// ============================================================================
// Property Validation
// ============================================================================

#[test]
fn test_invalid_edit_leaves_every_field_untouched() {
    let mut session = EditorSession::default();
    let a = session.add_node_at(0.0, 0.0).unwrap();
    let before = *session.model().node(a).unwrap().attributes();

    let err = session
        .edit_node_properties(a, &candidate(NodeType::Repeater, "0", "5.0", "0.0"))
        .unwrap_err();

    assert!(matches!(
        err,
        EditorError::Validation(ValidationError {
            field: PropertyField::NumQubits,
            ..
        })
    ));
    let after = *session.model().node(a).unwrap().attributes();
    assert_eq!(after, before);
    assert_eq!(after.coherence_time, 1.0);
}

#[test]
fn test_valid_edit_changes_fill() {
    let mut session = EditorSession::default();
    let a = session.add_node_at(0.0, 0.0).unwrap();

    session
        .edit_node_properties(a, &candidate(NodeType::MemoryDetector, "3", "0.25", "0.1"))
        .unwrap();

    let view = session.node_view(a).unwrap();
    assert_eq!(view.node_type, NodeType::MemoryDetector);
    assert_eq!(view.fill, NodeType::MemoryDetector.fill_color());
    assert_eq!(session.model().node(a).unwrap().attributes().num_qubits, 3);
}

// ============================================================================
// Undo / Redo
// ============================================================================

#[test]
fn test_undo_redo_restores_structure() {
    let mut session = EditorSession::default();
    let a = session.add_node_at(0.0, 0.0).unwrap();
    let b = session.add_node_at(50.0, 0.0).unwrap();
    session.connect(a, b).unwrap();
    let snapshot = session.document();

    assert!(session.undo().unwrap());
    assert!(session.undo().unwrap());
    assert!(session.undo().unwrap());
    assert!(!session.undo().unwrap());
    assert_eq!(session.model().node_count(), 0);

    while session.redo().unwrap() {}
    assert_eq!(session.document(), snapshot);
    session.model().verify_integrity().unwrap();
}

#[test]
fn test_new_command_discards_redo_branch() {
    let mut session = EditorSession::default();
    session.add_node_at(0.0, 0.0).unwrap();
    session.add_node_at(10.0, 0.0).unwrap();
    session.key_press(EditorKey::Undo).unwrap();
    assert!(session.commands().can_redo());

    session.add_node_at(20.0, 0.0).unwrap();
    assert!(!session.commands().can_redo());
    session.key_press(EditorKey::Redo).unwrap();
    assert_eq!(session.model().node_count(), 2);
}

#[test]
fn test_undo_limit_from_config() {
    let config = EditorConfig {
        undo_limit: Some(1),
        ..EditorConfig::default()
    };
    let mut session = EditorSession::new(config);
    session.add_node_at(0.0, 0.0).unwrap();
    session.add_node_at(10.0, 0.0).unwrap();

    assert!(session.undo().unwrap());
    assert!(!session.undo().unwrap());
    assert_eq!(session.model().node_count(), 1);
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_click_connect_then_delete_source() {
    let mut session = EditorSession::default();
    let recorder = RecordingObserver::new();
    session.subscribe(Box::new(recorder.clone()));

    session.pointer_press(PointerEvent::at(100.0, 100.0)).unwrap();
    session.pointer_press(PointerEvent::at(200.0, 100.0)).unwrap();
    let ids: Vec<NodeId> = session.model().nodes().map(|n| n.id()).collect();
    let (a, b) = (ids[0], ids[1]);

    session.set_mode(InteractionMode::Connect);
    session.pointer_press(PointerEvent::on(100.0, 100.0, a)).unwrap();
    session.pointer_press(PointerEvent::on(200.0, 100.0, b)).unwrap();
    assert_eq!(session.model().edge_count(), 1);
    assert_eq!(
        recorder.statuses(),
        vec![
            "Select the second node to connect.".to_string(),
            "Nodes connected.".to_string()
        ]
    );

    session.clear_selection();
    session.select(ItemRef::Node(a)).unwrap();
    session.key_press(EditorKey::Delete).unwrap();

    assert_eq!(session.model().edge_count(), 0);
    assert_eq!(session.model().node(b).unwrap().degree(), 0);
    assert!(!session.model().contains_node(a));
}

#[test]
fn test_coordinate_entry() {
    let mut session = EditorSession::default();
    let recorder = RecordingObserver::new();
    session.subscribe(Box::new(recorder.clone()));

    let id = session.add_node_at_coordinates("5", "5").unwrap();
    let view = session.node_view(id).unwrap();
    assert_eq!((view.x, view.y), (50.0, 50.0));
    assert_eq!(recorder.last_status().as_deref(), Some("Node added at (50, 50)."));

    assert!(matches!(
        session.add_node_at_coordinates("north", "2"),
        Err(EditorError::Parse { .. })
    ));
    assert_eq!(session.model().node_count(), 1);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_document_roundtrip_through_disk() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::new(dir.path().join("network.json"));

    let mut session = EditorSession::default();
    let ids = ring_with_chord(&mut session, 5);
    session
        .edit_node_properties(ids[2], &candidate(NodeType::Detector, "7", "2", "0.5"))
        .unwrap();
    store.save(&session.document()).unwrap();

    let loaded = EditorSession::from_document(&store.load().unwrap(), EditorConfig::default())
        .unwrap();
    assert_eq!(loaded.document(), session.document());
    assert_eq!(
        loaded.model().node(ids[2]).unwrap().attributes().node_type,
        NodeType::Detector
    );

    let summary = loaded.document().summary();
    assert_eq!(summary.node_count, 5);
    assert_eq!(summary.edge_count, 6);
    assert_eq!(summary.connected_components, 1);
}

#[test]
fn test_loaded_session_continues_numbering() {
    let mut session = EditorSession::default();
    ring_with_chord(&mut session, 3);
    let document = session.document();

    let mut loaded = EditorSession::from_document(&document, EditorConfig::default()).unwrap();
    let fresh = loaded.add_node_at(0.0, 0.0).unwrap();
    assert!(document.nodes.iter().all(|n| n.id != fresh));
    assert!(!loaded.commands().can_redo());
}
