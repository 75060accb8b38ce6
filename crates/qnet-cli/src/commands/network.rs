//! Document editing commands.
//!
//! Each command opens the document in a fresh session, performs one edit and
//! saves. Nothing is written when the edit is rejected.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use qnet_core::{EdgeId, NodeAttributes, NodeId, NodeType, Position, QubitTech};
use qnet_editor::{
    DocumentStore, EditorConfig, EditorObserver, EditorSession, ItemRef, NetworkDocument,
    PropertyPatch,
};
use serde::Serialize;
use tracing::{info, warn};

/// Where the document lives and how chatty to be.
#[derive(Debug, Clone)]
pub struct Context {
    pub path: PathBuf,
    pub quiet: bool,
}

impl Context {
    fn store(&self) -> DocumentStore {
        DocumentStore::new(&self.path)
    }

    /// Load the document into a session.
    pub fn open(&self, config: &EditorConfig) -> Result<EditorSession> {
        let store = self.store();
        if !store.exists() {
            anyhow::bail!(
                "No network document at {} (run `qnet new` first)",
                self.path.display()
            );
        }
        let document = store
            .load()
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let mut session = EditorSession::from_document(&document, config.clone())?;
        if !self.quiet {
            session.subscribe(Box::new(StatusPrinter));
        }
        Ok(session)
    }

    pub fn save(&self, session: &EditorSession) -> Result<()> {
        self.store().save(&session.document())?;
        Ok(())
    }
}

/// Prints status hints the way a status bar would show them.
struct StatusPrinter;

impl EditorObserver for StatusPrinter {
    fn on_status(&mut self, message: &str) {
        println!("{}", message);
    }
}

/// How a new node is placed.
#[derive(Debug, Clone)]
pub enum Placement {
    Scene { x: f64, y: f64 },
    Km { x_km: String, y_km: String },
}

/// Property flags given to `qnet edit`.
#[derive(Debug, Clone, Default)]
pub struct EditFields {
    pub node_type: Option<String>,
    pub num_qubits: Option<String>,
    pub qubit_tech: Option<String>,
    pub coherence_time: Option<String>,
    pub insertion_loss: Option<String>,
}

impl EditFields {
    fn into_patch(self) -> Result<PropertyPatch> {
        Ok(PropertyPatch {
            node_type: self
                .node_type
                .as_deref()
                .map(str::parse::<NodeType>)
                .transpose()?,
            num_qubits: self.num_qubits,
            qubit_tech: self
                .qubit_tech
                .as_deref()
                .map(str::parse::<QubitTech>)
                .transpose()?,
            coherence_time: self.coherence_time,
            insertion_loss: self.insertion_loss,
        })
    }
}

/// Create an empty document.
pub fn new(ctx: &Context, force: bool) -> Result<()> {
    let store = ctx.store();
    if store.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            ctx.path.display()
        );
    }
    store.save(&NetworkDocument::empty())?;
    if !ctx.quiet {
        println!("✅ Created {}", ctx.path.display());
    }
    Ok(())
}

pub fn add_node(
    ctx: &Context,
    config: &EditorConfig,
    placement: Placement,
    node_type: Option<&str>,
) -> Result<()> {
    let node_type: Option<NodeType> = node_type.map(str::parse).transpose()?;
    let mut session = ctx.open(config)?;

    let id = match placement {
        Placement::Scene { x, y } => {
            let attributes = node_type.map(|node_type| NodeAttributes {
                node_type,
                ..NodeAttributes::default()
            });
            session.add_node_with(Position::new(x, y), attributes)?
        }
        Placement::Km { x_km, y_km } => {
            let id = session.add_node_at_coordinates(&x_km, &y_km)?;
            if let Some(node_type) = node_type {
                let patch = PropertyPatch {
                    node_type: Some(node_type),
                    ..PropertyPatch::default()
                };
                session.patch_node_properties(id, &patch)?;
            }
            id
        }
    };

    ctx.save(&session)?;
    if !ctx.quiet {
        if let Some(node) = session.model().node(id) {
            println!(
                "✅ Added {} node {} at {}",
                node.attributes().node_type,
                id,
                node.position()
            );
        }
    }
    Ok(())
}

pub fn connect(ctx: &Context, config: &EditorConfig, source: &str, target: &str) -> Result<()> {
    let source: NodeId = source.parse()?;
    let target: NodeId = target.parse()?;
    let mut session = ctx.open(config)?;

    let edge = session.connect(source, target)?;
    ctx.save(&session)?;
    if !ctx.quiet {
        println!("✅ Added edge {} ({} - {})", edge, source, target);
    }
    Ok(())
}

pub fn move_node(ctx: &Context, config: &EditorConfig, id: &str, x: f64, y: f64) -> Result<()> {
    let id: NodeId = id.parse()?;
    let mut session = ctx.open(config)?;

    session.move_node(id, x, y)?;
    ctx.save(&session)?;
    if !ctx.quiet {
        println!("✅ Moved {} to {}", id, Position::new(x, y));
    }
    Ok(())
}

pub fn edit(ctx: &Context, config: &EditorConfig, id: &str, fields: EditFields) -> Result<()> {
    let id: NodeId = id.parse()?;
    let patch = fields.into_patch()?;
    if patch.is_empty() {
        anyhow::bail!("Nothing to edit: give at least one property flag");
    }
    let mut session = ctx.open(config)?;

    session.patch_node_properties(id, &patch)?;
    ctx.save(&session)?;
    if !ctx.quiet {
        println!("✅ Updated {}", id);
    }
    Ok(())
}

pub fn delete(
    ctx: &Context,
    config: &EditorConfig,
    nodes: &[String],
    edges: &[String],
) -> Result<()> {
    if nodes.is_empty() && edges.is_empty() {
        anyhow::bail!("Nothing to delete: give --node or --edge");
    }

    let mut items = Vec::with_capacity(nodes.len() + edges.len());
    for node in nodes {
        items.push(ItemRef::Node(node.parse::<NodeId>()?));
    }
    for edge in edges {
        items.push(ItemRef::Edge(edge.parse::<EdgeId>()?));
    }

    let mut session = ctx.open(config)?;
    let report = session.delete_selected(items.iter().copied());
    for item in &items {
        let deleted = match item {
            ItemRef::Node(id) => report.nodes.contains(id),
            ItemRef::Edge(id) => report.edges.contains(id),
        };
        if !deleted {
            warn!(%item, "Not in the document; skipped");
        }
    }

    ctx.save(&session)?;
    info!(nodes = report.nodes.len(), edges = report.edges.len(), "Deleted items");
    if !ctx.quiet {
        println!(
            "🗑️  Deleted {} node(s) and {} edge(s)",
            report.nodes.len(),
            report.edges.len()
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    document: &'a NetworkDocument,
    summary: qnet_core::TopologySummary,
}

pub fn show(ctx: &Context, config: &EditorConfig, json: bool) -> Result<()> {
    let session = ctx.open(config)?;
    let document = session.document();
    let summary = document.summary();

    if json {
        let output = ShowOutput {
            document: &document,
            summary,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("📄 Network: {}", ctx.path.display());
    println!("{:-<60}", "");
    println!("Nodes ({}):", summary.node_count);
    for view in session.node_views() {
        let attributes = session
            .model()
            .node(view.id)
            .map(|n| *n.attributes())
            .unwrap_or_default();
        println!(
            "  {:<5} {:<16} ({}, {})  qubits={} tech={} T2={} loss={}  [{}]",
            view.id.to_string(),
            view.node_type.label(),
            view.x,
            view.y,
            attributes.num_qubits,
            attributes.qubit_tech.label(),
            attributes.coherence_time,
            attributes.insertion_loss,
            view.fill.hex()
        );
    }
    println!("Edges ({}):", summary.edge_count);
    for edge in session.model().edges() {
        println!("  {:<5} {} - {}", edge.id().to_string(), edge.source(), edge.target());
    }
    println!("{:-<60}", "");
    println!("Connected components: {}", summary.connected_components);
    if !summary.isolated_nodes.is_empty() {
        let isolated: Vec<String> = summary.isolated_nodes.iter().map(|n| n.to_string()).collect();
        println!("Isolated nodes:       {}", isolated.join(", "));
    }
    for (node_type, count) in &summary.nodes_by_type {
        println!("  {:<16} {}", node_type.label(), count);
    }
    Ok(())
}
