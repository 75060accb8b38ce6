//! Node and edge tables with referential integrity.
//!
//! Nodes and edges live in flat tables keyed by id. An edge stores the ids of
//! its endpoints and every node keeps the set of ids of its incident edges, so
//! there are no ownership cycles. Edge geometry is never stored: it is derived
//! from the current endpoint positions whenever it is asked for.

use std::collections::{BTreeMap, BTreeSet};

use qnet_core::{
    EdgeId, EdgeRecord, FillColor, NetworkDocument, NodeAttributes, NodeId, NodeRecord, Position,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EditorError, EditorResult};

/// A network node as held by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    position: Position,
    attributes: NodeAttributes,
    incident: BTreeSet<EdgeId>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn attributes(&self) -> &NodeAttributes {
        &self.attributes
    }

    /// Ids of the edges touching this node.
    pub fn incident_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.incident.iter().copied()
    }

    pub fn degree(&self) -> usize {
        self.incident.len()
    }

    /// Fill color derived from the node type.
    pub fn fill_color(&self) -> FillColor {
        self.attributes.node_type.fill_color()
    }

    /// Persistable form of this node (incident set excluded).
    pub fn to_record(&self) -> NodeRecord {
        NodeRecord {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            attributes: self.attributes,
        }
    }
}

/// An undirected link between two distinct nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    id: EdgeId,
    source: NodeId,
    target: NodeId,
}

impl Edge {
    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Whether `node` is one of this edge's endpoints.
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }

    pub fn to_record(&self) -> EdgeRecord {
        EdgeRecord {
            id: self.id,
            source_id: self.source,
            target_id: self.target,
        }
    }
}

/// Endpoints of an edge, computed from node positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeGeometry {
    pub source: Position,
    pub target: Position,
}

/// Notification produced by a model mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ModelEvent {
    NodeAdded { id: NodeId },
    NodeRemoved { id: NodeId },
    EdgeAdded { id: EdgeId },
    EdgeRemoved { id: EdgeId },
    NodeMoved { id: NodeId, position: Position },
    /// An edge's derived endpoints changed and should be redrawn.
    EdgeGeometryChanged { id: EdgeId, geometry: EdgeGeometry },
    /// A node's attributes changed, so its fill color may have too.
    AppearanceChanged { id: NodeId, fill: FillColor },
}

/// What a node removal took with it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    pub node: NodeRecord,
    pub edges: Vec<EdgeRecord>,
}

/// Owns every node and edge of the network being edited.
#[derive(Debug, Default, Clone)]
pub struct GraphModel {
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, Edge>,
    next_node_id: u64,
    next_edge_id: u64,
    events: Vec<ModelEvent>,
}

impl GraphModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Add a node at `position`. Default attributes are used when none are given.
    ///
    /// Non-finite coordinates are rejected and nothing changes.
    pub fn add_node(
        &mut self,
        position: Position,
        attributes: Option<NodeAttributes>,
    ) -> EditorResult<NodeId> {
        check_position(position)?;
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;

        self.nodes.insert(
            id,
            Node {
                id,
                position,
                attributes: attributes.unwrap_or_default(),
                incident: BTreeSet::new(),
            },
        );
        debug!(node = %id, x = position.x, y = position.y, "Added node");
        self.events.push(ModelEvent::NodeAdded { id });
        Ok(id)
    }

    /// Insert a node with a known id unless one with that id is already present.
    ///
    /// Returns `true` if the node was inserted.
    pub fn restore_node(&mut self, record: &NodeRecord) -> bool {
        if self.nodes.contains_key(&record.id) {
            return false;
        }

        self.next_node_id = self.next_node_id.max(record.id.0 + 1);
        self.nodes.insert(
            record.id,
            Node {
                id: record.id,
                position: record.position(),
                attributes: record.attributes,
                incident: BTreeSet::new(),
            },
        );
        debug!(node = %record.id, "Restored node");
        self.events.push(ModelEvent::NodeAdded { id: record.id });
        true
    }

    /// Remove a node together with every edge incident to it.
    pub fn remove_node(&mut self, id: NodeId) -> EditorResult<RemovedNode> {
        let incident: Vec<EdgeId> = match self.nodes.get(&id) {
            Some(node) => node.incident.iter().copied().collect(),
            None => return Err(EditorError::node_not_found(id)),
        };

        let edges: Vec<EdgeRecord> = incident
            .into_iter()
            .filter_map(|edge_id| self.detach_edge(edge_id))
            .map(|edge| edge.to_record())
            .collect();

        let node = self
            .nodes
            .remove(&id)
            .ok_or_else(|| EditorError::node_not_found(id))?;
        debug!(node = %id, cascaded = edges.len(), "Removed node");
        self.events.push(ModelEvent::NodeRemoved { id });

        Ok(RemovedNode {
            node: node.to_record(),
            edges,
        })
    }

    /// Move a node. Every incident edge is reported as having new geometry.
    pub fn set_node_position(&mut self, id: NodeId, position: Position) -> EditorResult<()> {
        check_position(position)?;
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| EditorError::node_not_found(id))?;
        node.position = position;
        let incident: Vec<EdgeId> = node.incident.iter().copied().collect();
        debug!(node = %id, x = position.x, y = position.y, "Moved node");

        self.events.push(ModelEvent::NodeMoved { id, position });
        for edge_id in incident {
            if let Some(geometry) = self.edge_geometry(edge_id) {
                self.events.push(ModelEvent::EdgeGeometryChanged {
                    id: edge_id,
                    geometry,
                });
            }
        }
        Ok(())
    }

    /// Replace a node's attributes wholesale. Callers validate first.
    pub(crate) fn set_node_attributes(
        &mut self,
        id: NodeId,
        attributes: NodeAttributes,
    ) -> EditorResult<()> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| EditorError::node_not_found(id))?;
        node.attributes = attributes;
        debug!(node = %id, ?attributes, "Updated node attributes");
        self.events.push(ModelEvent::AppearanceChanged {
            id,
            fill: attributes.node_type.fill_color(),
        });
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // =========================================================================
    // Edges
    // =========================================================================

    /// Link two distinct existing nodes. Parallel edges are allowed.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId) -> EditorResult<EdgeId> {
        self.check_endpoints(source, target)?;

        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        self.link(Edge { id, source, target });
        Ok(id)
    }

    /// Re-insert an edge with a known id unless it is already present.
    ///
    /// Returns `Ok(true)` if the edge was inserted.
    pub fn restore_edge(&mut self, record: &EdgeRecord) -> EditorResult<bool> {
        if self.edges.contains_key(&record.id) {
            return Ok(false);
        }
        self.check_endpoints(record.source_id, record.target_id)?;

        self.next_edge_id = self.next_edge_id.max(record.id.0 + 1);
        self.link(Edge {
            id: record.id,
            source: record.source_id,
            target: record.target_id,
        });
        Ok(true)
    }

    /// Remove an edge and unregister it from its endpoints.
    ///
    /// An endpoint that no longer lists the edge is tolerated.
    pub fn remove_edge(&mut self, id: EdgeId) -> EditorResult<Edge> {
        self.detach_edge(id).ok_or_else(|| EditorError::edge_not_found(id))
    }

    fn detach_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(&id)?;

        for endpoint in [edge.source, edge.target] {
            let detached = self
                .nodes
                .get_mut(&endpoint)
                .map(|node| node.incident.remove(&id))
                .unwrap_or(false);
            if !detached {
                warn!(edge = %id, node = %endpoint, "Edge was already detached from endpoint");
            }
        }

        debug!(edge = %id, source = %edge.source, target = %edge.target, "Removed edge");
        self.events.push(ModelEvent::EdgeRemoved { id });
        Some(edge)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains_key(&id)
    }

    /// Edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Current endpoints of an edge, read from its nodes.
    pub fn edge_geometry(&self, id: EdgeId) -> Option<EdgeGeometry> {
        let edge = self.edges.get(&id)?;
        let source = self.nodes.get(&edge.source)?;
        let target = self.nodes.get(&edge.target)?;
        Some(EdgeGeometry {
            source: source.position,
            target: target.position,
        })
    }

    fn check_endpoints(&self, source: NodeId, target: NodeId) -> EditorResult<()> {
        if source == target {
            return Err(EditorError::invalid_edge(source, target, "self-loop"));
        }
        for endpoint in [source, target] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(EditorError::invalid_edge(
                    source,
                    target,
                    format!("unknown node {}", endpoint),
                ));
            }
        }
        Ok(())
    }

    fn link(&mut self, edge: Edge) {
        for endpoint in [edge.source, edge.target] {
            if let Some(node) = self.nodes.get_mut(&endpoint) {
                node.incident.insert(edge.id);
            }
        }
        debug!(edge = %edge.id, source = %edge.source, target = %edge.target, "Added edge");
        self.edges.insert(edge.id, edge);
        self.events.push(ModelEvent::EdgeAdded { id: edge.id });
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Drain the notifications produced since the last call.
    pub fn take_events(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // Documents
    // =========================================================================

    /// Snapshot the model as a persistable document.
    pub fn to_document(&self) -> NetworkDocument {
        NetworkDocument {
            nodes: self.nodes.values().map(Node::to_record).collect(),
            edges: self.edges.values().map(Edge::to_record).collect(),
        }
    }

    /// Build a model from a document, rejecting anything that breaks the invariants.
    pub fn from_document(document: &NetworkDocument) -> EditorResult<Self> {
        let mut model = Self::new();

        for record in &document.nodes {
            if !model.restore_node(record) {
                return Err(EditorError::InvalidDocument {
                    message: format!("duplicate node id {}", record.id),
                });
            }
        }

        for record in &document.edges {
            match model.restore_edge(record) {
                Ok(true) => {}
                Ok(false) => {
                    return Err(EditorError::InvalidDocument {
                        message: format!("duplicate edge id {}", record.id),
                    })
                }
                Err(err) => {
                    return Err(EditorError::InvalidDocument {
                        message: format!("edge {}: {}", record.id, err),
                    })
                }
            }
        }

        model.events.clear();
        Ok(model)
    }

    /// Check that edges and incident sets agree.
    pub fn verify_integrity(&self) -> EditorResult<()> {
        for edge in self.edges.values() {
            if edge.source == edge.target {
                return Err(inconsistent(format!("edge {} is a self-loop", edge.id)));
            }
            for endpoint in [edge.source, edge.target] {
                match self.nodes.get(&endpoint) {
                    Some(node) if node.incident.contains(&edge.id) => {}
                    Some(_) => {
                        return Err(inconsistent(format!(
                            "node {} does not list incident edge {}",
                            endpoint, edge.id
                        )))
                    }
                    None => {
                        return Err(inconsistent(format!(
                            "edge {} references missing node {}",
                            edge.id, endpoint
                        )))
                    }
                }
            }
        }

        for node in self.nodes.values() {
            for edge_id in &node.incident {
                match self.edges.get(edge_id) {
                    Some(edge) if edge.touches(node.id) => {}
                    _ => {
                        return Err(inconsistent(format!(
                            "node {} lists dangling edge {}",
                            node.id, edge_id
                        )))
                    }
                }
            }
        }

        Ok(())
    }
}

fn inconsistent(message: String) -> EditorError {
    EditorError::InconsistentState { message }
}

/// Documents store plain JSON numbers, so NaN and infinities cannot be saved.
pub(crate) fn check_position(position: Position) -> EditorResult<()> {
    if position.x.is_finite() && position.y.is_finite() {
        Ok(())
    } else {
        Err(EditorError::parse(
            position.to_string(),
            "coordinates must be finite",
        ))
    }
}
