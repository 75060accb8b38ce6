//! Reversible structural edits and the linear undo stack.
//!
//! Only node and edge creation are recorded. Property edits, moves and
//! deletions are applied directly and cannot be undone.

use std::fmt;

use qnet_core::{EdgeRecord, NodeAttributes, NodeId, NodeRecord, Position};
use tracing::debug;

use crate::error::EditorResult;
use crate::model::GraphModel;
use crate::selection::ItemRef;

/// A reversible operation on the model.
pub trait Command: fmt::Debug {
    /// Short human-readable description ("Add Node").
    fn label(&self) -> &str;

    /// Apply (or re-apply) the operation.
    fn redo(&mut self, model: &mut GraphModel) -> EditorResult<()>;

    /// Revert the operation.
    fn undo(&mut self, model: &mut GraphModel) -> EditorResult<()>;

    /// Item created by the most recent `redo`, if any.
    fn created(&self) -> Option<ItemRef>;
}

/// Creates a node; undo removes it.
#[derive(Debug, Clone)]
pub struct AddNodeCommand {
    position: Position,
    attributes: Option<NodeAttributes>,
    node: Option<NodeRecord>,
}

impl AddNodeCommand {
    pub fn new(position: Position, attributes: Option<NodeAttributes>) -> Self {
        Self {
            position,
            attributes,
            node: None,
        }
    }

    pub fn node_id(&self) -> Option<NodeId> {
        self.node.as_ref().map(|n| n.id)
    }
}

impl Command for AddNodeCommand {
    fn label(&self) -> &str {
        "Add Node"
    }

    fn redo(&mut self, model: &mut GraphModel) -> EditorResult<()> {
        match &self.node {
            Some(record) => {
                model.restore_node(record);
            }
            None => {
                let id = model.add_node(self.position, self.attributes)?;
                self.node = model.node(id).map(|n| n.to_record());
            }
        }
        Ok(())
    }

    fn undo(&mut self, model: &mut GraphModel) -> EditorResult<()> {
        let Some(record) = self.node.as_mut() else {
            return Ok(());
        };
        // Keep whatever the node looked like at undo time so redo brings it back as-is.
        if let Some(node) = model.node(record.id) {
            *record = node.to_record();
            model.remove_node(record.id)?;
        }
        Ok(())
    }

    fn created(&self) -> Option<ItemRef> {
        self.node_id().map(ItemRef::Node)
    }
}

/// Creates an edge; undo removes it.
#[derive(Debug, Clone)]
pub struct AddEdgeCommand {
    source: NodeId,
    target: NodeId,
    edge: Option<EdgeRecord>,
}

impl AddEdgeCommand {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            source,
            target,
            edge: None,
        }
    }
}

impl Command for AddEdgeCommand {
    fn label(&self) -> &str {
        "Add Edge"
    }

    fn redo(&mut self, model: &mut GraphModel) -> EditorResult<()> {
        match &self.edge {
            Some(record) => {
                model.restore_edge(record)?;
            }
            None => {
                let id = model.add_edge(self.source, self.target)?;
                self.edge = model.edge(id).map(|e| e.to_record());
            }
        }
        Ok(())
    }

    fn undo(&mut self, model: &mut GraphModel) -> EditorResult<()> {
        if let Some(record) = &self.edge {
            if model.contains_edge(record.id) {
                model.remove_edge(record.id)?;
            }
        }
        Ok(())
    }

    fn created(&self) -> Option<ItemRef> {
        self.edge.as_ref().map(|e| ItemRef::Edge(e.id))
    }
}

/// Linear undo history.
///
/// Commands below the cursor are applied; commands at or above it can be
/// redone. Pushing discards everything above the cursor.
#[derive(Debug, Default)]
pub struct CommandStack {
    commands: Vec<Box<dyn Command>>,
    cursor: usize,
    limit: Option<usize>,
}

impl CommandStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` commands; the oldest are dropped first.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Run a command and record it. A failed command is not recorded.
    pub fn push(
        &mut self,
        mut command: Box<dyn Command>,
        model: &mut GraphModel,
    ) -> EditorResult<Option<ItemRef>> {
        command.redo(model)?;
        let created = command.created();

        let discarded = self.commands.len() - self.cursor;
        self.commands.truncate(self.cursor);
        debug!(command = command.label(), discarded, "Pushed command");
        self.commands.push(command);
        self.cursor += 1;

        if let Some(limit) = self.limit {
            if self.commands.len() > limit {
                let excess = self.commands.len() - limit;
                self.commands.drain(..excess);
                self.cursor -= excess;
            }
        }

        Ok(created)
    }

    /// Revert the most recent applied command. Returns `false` if there is none.
    pub fn undo(&mut self, model: &mut GraphModel) -> EditorResult<bool> {
        if self.cursor == 0 {
            return Ok(false);
        }
        let command = &mut self.commands[self.cursor - 1];
        command.undo(model)?;
        debug!(command = command.label(), "Undo");
        self.cursor -= 1;
        Ok(true)
    }

    /// Re-apply the next undone command. Returns `false` if there is none.
    pub fn redo(&mut self, model: &mut GraphModel) -> EditorResult<bool> {
        let Some(command) = self.commands.get_mut(self.cursor) else {
            return Ok(false);
        };
        command.redo(model)?;
        debug!(command = command.label(), "Redo");
        self.cursor += 1;
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.commands.len()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.commands.get(i))
            .map(|c| c.label())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.commands.get(self.cursor).map(|c| c.label())
    }

    /// Number of recorded commands, applied or not.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.cursor = 0;
    }
}
