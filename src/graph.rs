//! Command graph
//!
//! A static tree of every command reachable in the shell. Root and context-entry nodes
//! are scopes; their children are the commands valid while that context is on top of
//! the stack. A context that can be entered from several parents (route tables) gets a
//! separate subtree under each, so every node has exactly one path from root.

pub mod builder;
pub mod context_type;
pub mod export;
pub mod resolve;
pub mod validate;

pub use builder::{CommandSpec, ContextSpec, STANDARD_CONTEXTS};
pub use context_type::ContextType;
pub use export::{export_graph, fingerprint, ExportFormat};
pub use resolve::{normalize_token, Resolution};
pub use validate::{check_tree, validate_graph, GraphReport, HandlerLookup};

use serde::Serialize;
use std::collections::HashMap;

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Root,
    ContextEntry,
    Show,
    Set,
    Action,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::ContextEntry => "context-entry",
            NodeKind::Show => "show",
            NodeKind::Set => "set",
            NodeKind::Action => "action",
        }
    }

    /// Nodes whose children are the commands of a context.
    pub fn is_scope(&self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::ContextEntry)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandNode {
    /// Dotted unique path, e.g. `root.vpc.show.subnets`.
    pub path: String,
    pub kind: NodeKind,
    pub label: String,
    pub aliases: Vec<String>,
    pub summary: String,
    /// Context in which this command is typed.
    pub context: ContextType,
    /// Context a context-entry node pushes.
    pub enters: Option<ContextType>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl CommandNode {
    /// The words a user types to reach this node, before any arguments.
    pub fn phrase(&self) -> String {
        match self.kind {
            NodeKind::Root => "root".to_string(),
            NodeKind::Show => format!("show {}", self.label),
            NodeKind::Set | NodeKind::ContextEntry => format!("set {}", self.label),
            NodeKind::Action => self.label.clone(),
        }
    }

    /// Context this node's commands run in: the entered context for scopes.
    pub fn scope_context(&self) -> ContextType {
        self.enters.unwrap_or(self.context)
    }
}

#[derive(Debug, Clone)]
pub struct CommandGraph {
    nodes: Vec<CommandNode>,
    by_path: HashMap<String, NodeId>,
}

impl CommandGraph {
    pub(crate) fn from_parts(nodes: Vec<CommandNode>, by_path: HashMap<String, NodeId>) -> Self {
        Self { nodes, by_path }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[CommandNode] {
        &self.nodes
    }

    pub fn find(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &CommandNode> {
        self.nodes[id].children.iter().map(move |c| &self.nodes[*c])
    }

    /// Pre-order depth-first traversal from root, children in declaration order.
    pub fn dfs(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return order;
        }
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            for child in self.nodes[id].children.iter().rev() {
                stack.push(*child);
            }
        }
        order
    }

    /// Depth of a node below root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[id].parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes[parent].parent;
        }
        depth
    }

    /// Every scope node that enters `context`.
    pub fn entries_for(&self, context: ContextType) -> Vec<NodeId> {
        self.dfs()
            .into_iter()
            .filter(|id| self.nodes[*id].enters == Some(context))
            .collect()
    }
}
