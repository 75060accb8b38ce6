//! Core domain types shared across the quantum network designer workspace.

use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Scene units per kilometre when placing nodes by geographic coordinates.
pub const SCENE_UNITS_PER_KM: f64 = 10.0;

/// Radius (in scene units) used to draw a node.
pub const DEFAULT_NODE_RADIUS: f64 = 30.0;

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier for nodes within a network.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(pub u64);

/// Identifier for edges within a network.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EdgeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Parse `"n3"` or a bare `"3"`.
impl FromStr for NodeId {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(s, 'n')
            .map(NodeId)
            .ok_or_else(|| UnknownVariant::new("node id", s))
    }
}

/// Parse `"e3"` or a bare `"3"`.
impl FromStr for EdgeId {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(s, 'e')
            .map(EdgeId)
            .ok_or_else(|| UnknownVariant::new("edge id", s))
    }
}

fn parse_prefixed(s: &str, prefix: char) -> Option<u64> {
    let s = s.trim();
    let digits = s
        .strip_prefix(prefix)
        .or_else(|| s.strip_prefix(prefix.to_ascii_uppercase()))
        .unwrap_or(s);
    digits.parse().ok()
}

// =============================================================================
// Geometry
// =============================================================================

/// A point in scene coordinates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert kilometre coordinates into scene units.
    pub fn from_km(x_km: f64, y_km: f64, scale: f64) -> Self {
        Self {
            x: x_km * scale,
            y: y_km * scale,
        }
    }

    /// Component-wise offset from `other` to `self`.
    pub fn offset_from(&self, other: Position) -> Position {
        Position {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    pub fn translated(&self, offset: Position) -> Position {
        Position {
            x: self.x + offset.x,
            y: self.y + offset.y,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// =============================================================================
// Node Attributes
// =============================================================================

/// Role a node plays in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    /// Quantum memory.
    #[default]
    Memory,
    /// Photon detector.
    Detector,
    /// Combined memory and detector station.
    MemoryDetector,
    /// Entanglement repeater.
    Repeater,
}

impl NodeType {
    /// All node types, in the order they are offered to the user.
    pub const ALL: [NodeType; 4] = [
        NodeType::Memory,
        NodeType::Detector,
        NodeType::MemoryDetector,
        NodeType::Repeater,
    ];

    /// Get the display label for the node type.
    pub fn label(&self) -> &'static str {
        match self {
            NodeType::Memory => "memory",
            NodeType::Detector => "detector",
            NodeType::MemoryDetector => "memory-detector",
            NodeType::Repeater => "repeater",
        }
    }

    /// Fill color used when rendering a node of this type.
    pub fn fill_color(&self) -> FillColor {
        match self {
            NodeType::Memory => FillColor::Yellow,
            NodeType::Detector => FillColor::LightBlue,
            NodeType::MemoryDetector => FillColor::Pink,
            NodeType::Repeater => FillColor::LightGreen,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NodeType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant::new("node type", s))
    }
}

/// Physical platform the node's qubits are built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QubitTech {
    #[default]
    #[serde(rename = "Color centers")]
    ColorCenters,
    Atoms,
    Ions,
    Superconducting,
}

impl QubitTech {
    pub const ALL: [QubitTech; 4] = [
        QubitTech::ColorCenters,
        QubitTech::Atoms,
        QubitTech::Ions,
        QubitTech::Superconducting,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            QubitTech::ColorCenters => "Color centers",
            QubitTech::Atoms => "Atoms",
            QubitTech::Ions => "Ions",
            QubitTech::Superconducting => "Superconducting",
        }
    }
}

impl fmt::Display for QubitTech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QubitTech {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', '_'], " ");
        QubitTech::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| UnknownVariant::new("qubit technology", s))
    }
}

/// Returned when a string does not name a known enumerated value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Named fill colors for rendered nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FillColor {
    Yellow,
    LightBlue,
    Pink,
    LightGreen,
}

impl FillColor {
    /// RGB triple matching the CSS named color.
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            FillColor::Yellow => [255, 255, 0],
            FillColor::LightBlue => [173, 216, 230],
            FillColor::Pink => [255, 192, 203],
            FillColor::LightGreen => [144, 238, 144],
        }
    }

    /// Hex string (`#rrggbb`).
    pub fn hex(&self) -> String {
        let [r, g, b] = self.rgb();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

/// Editable physical parameters of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeAttributes {
    /// Role of the node.
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Number of qubits held by the node (>= 1).
    pub num_qubits: u32,
    /// Qubit platform.
    pub qubit_tech: QubitTech,
    /// Coherence time in seconds (>= 0).
    pub coherence_time: f64,
    /// Photon insertion loss in dB (>= 0).
    pub insertion_loss: f64,
}

impl Default for NodeAttributes {
    fn default() -> Self {
        Self {
            node_type: NodeType::Memory,
            num_qubits: 1,
            qubit_tech: QubitTech::ColorCenters,
            coherence_time: 1.0,
            insertion_loss: 0.0,
        }
    }
}

// =============================================================================
// Persisted Document
// =============================================================================

/// A node as stored in a network document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    #[serde(flatten)]
    pub attributes: NodeAttributes,
}

impl NodeRecord {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// An edge as stored in a network document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: EdgeId,
    pub source_id: NodeId,
    pub target_id: NodeId,
}

/// Serializable snapshot of an entire network topology.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDocument {
    /// Nodes in id order.
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    /// Edges in id order.
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl NetworkDocument {
    /// Creates an empty document.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Parse a document from JSON text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Render the document as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Convert to an undirected petgraph for analysis.
    /// Edges with unknown endpoints are skipped.
    pub fn to_petgraph(&self) -> (UnGraph<NodeRecord, EdgeId>, HashMap<NodeId, NodeIndex>) {
        let mut graph = UnGraph::default();
        let mut id_to_index = HashMap::new();

        for node in &self.nodes {
            let idx = graph.add_node(node.clone());
            id_to_index.insert(node.id, idx);
        }

        for edge in &self.edges {
            if let (Some(&a), Some(&b)) = (
                id_to_index.get(&edge.source_id),
                id_to_index.get(&edge.target_id),
            ) {
                graph.add_edge(a, b, edge.id);
            }
        }

        (graph, id_to_index)
    }

    /// Summarize the topology.
    pub fn summary(&self) -> TopologySummary {
        let (graph, _) = self.to_petgraph();

        let mut nodes_by_type = BTreeMap::new();
        for node in &self.nodes {
            *nodes_by_type.entry(node.attributes.node_type).or_insert(0) += 1;
        }

        let isolated_nodes = graph
            .node_indices()
            .filter(|&idx| graph.neighbors(idx).next().is_none())
            .filter_map(|idx| graph.node_weight(idx).map(|n| n.id))
            .collect();

        TopologySummary {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            nodes_by_type,
            connected_components: connected_components(&graph),
            isolated_nodes,
        }
    }
}

/// Aggregate statistics about a network document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes_by_type: BTreeMap<NodeType, usize>,
    pub connected_components: usize,
    pub isolated_nodes: Vec<NodeId>,
}
