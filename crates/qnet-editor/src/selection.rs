//! Selection state and cascading deletion.

use std::collections::BTreeSet;
use std::fmt;

use qnet_core::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::GraphModel;

/// Reference to a selectable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ItemRef {
    Node(NodeId),
    Edge(EdgeId),
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Node(id) => write!(f, "node {}", id),
            ItemRef::Edge(id) => write!(f, "edge {}", id),
        }
    }
}

impl From<NodeId> for ItemRef {
    fn from(id: NodeId) -> Self {
        ItemRef::Node(id)
    }
}

impl From<EdgeId> for ItemRef {
    fn from(id: EdgeId) -> Self {
        ItemRef::Edge(id)
    }
}

/// Currently selected items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    items: BTreeSet<ItemRef>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, item: impl Into<ItemRef>) {
        self.items.insert(item.into());
    }

    pub fn deselect(&mut self, item: impl Into<ItemRef>) {
        self.items.remove(&item.into());
    }

    /// Flip an item's membership. Returns whether it is now selected.
    pub fn toggle(&mut self, item: impl Into<ItemRef>) -> bool {
        let item = item.into();
        if self.items.remove(&item) {
            false
        } else {
            self.items.insert(item);
            true
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(&self, item: impl Into<ItemRef>) -> bool {
        self.items.contains(&item.into())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = ItemRef> + '_ {
        self.items.iter().copied()
    }

    /// Drop references to items the model no longer holds.
    pub fn retain_existing(&mut self, model: &GraphModel) {
        self.items.retain(|item| match item {
            ItemRef::Node(id) => model.contains_node(*id),
            ItemRef::Edge(id) => model.contains_edge(*id),
        });
    }
}

/// Items actually removed by a deletion batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
}

impl DeletionReport {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Delete a mixed batch of nodes and edges.
///
/// Nodes go first, each taking its incident edges with it. Remaining edges are
/// then removed directly. Items that are unknown or already gone (duplicates,
/// cascaded edges) are skipped silently.
pub fn delete_items<I>(model: &mut GraphModel, items: I) -> DeletionReport
where
    I: IntoIterator<Item = ItemRef>,
{
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for item in items {
        match item {
            ItemRef::Node(id) => nodes.push(id),
            ItemRef::Edge(id) => edges.push(id),
        }
    }

    let mut report = DeletionReport::default();

    for id in nodes {
        if let Ok(removed) = model.remove_node(id) {
            report.edges.extend(removed.edges.iter().map(|e| e.id));
            report.nodes.push(id);
        }
    }

    for id in edges {
        if model.remove_edge(id).is_ok() {
            report.edges.push(id);
        }
    }

    debug!(
        nodes = report.nodes.len(),
        edges = report.edges.len(),
        "Deleted items"
    );
    report
}
