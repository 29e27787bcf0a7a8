//! Graph validation against a handler registry.

use crate::graph::{CommandGraph, NodeKind};
use serde::Serialize;
use std::collections::HashSet;

/// Anything that can say whether a command path has a handler.
pub trait HandlerLookup {
    fn has_handler(&self, path: &str) -> bool;
}

impl HandlerLookup for HashSet<String> {
    fn has_handler(&self, path: &str) -> bool {
        self.contains(path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphReport {
    /// Show, set and action nodes examined.
    pub checked: usize,
    /// Paths with no handler, in depth-first order.
    pub unimplemented: Vec<String>,
}

impl GraphReport {
    pub fn is_complete(&self) -> bool {
        self.unimplemented.is_empty()
    }
}

/// Walk the graph from root and collect every leaf command without a handler.
///
/// Context-entry nodes are handled by the dispatcher itself and are not checked.
pub fn validate_graph(graph: &CommandGraph, lookup: &dyn HandlerLookup) -> GraphReport {
    let mut report = GraphReport::default();
    for id in graph.dfs() {
        let node = graph.node(id);
        if matches!(node.kind, NodeKind::Show | NodeKind::Set | NodeKind::Action) {
            report.checked += 1;
            if !lookup.has_handler(&node.path) {
                report.unimplemented.push(node.path.clone());
            }
        }
    }
    report
}

/// Structural violations of the tree invariant; empty for a well-formed graph.
pub fn check_tree(graph: &CommandGraph) -> Vec<String> {
    let mut problems = Vec::new();
    let mut seen = HashSet::new();
    let mut roots = 0;

    for (id, node) in graph.nodes().iter().enumerate() {
        if !seen.insert(node.path.as_str()) {
            problems.push(format!("duplicate path {}", node.path));
        }
        match node.parent {
            None => roots += 1,
            Some(parent) => {
                let parent_node = graph.node(parent);
                if !node.path.starts_with(&format!("{}.", parent_node.path)) {
                    problems.push(format!(
                        "{} does not extend parent path {}",
                        node.path, parent_node.path
                    ));
                }
                if !parent_node.children.contains(&id) {
                    problems.push(format!("{} missing from its parent's children", node.path));
                }
                if !parent_node.kind.is_scope() {
                    problems.push(format!("{} hangs off leaf {}", node.path, parent_node.path));
                }
            }
        }
    }
    if roots != 1 {
        problems.push(format!("expected one root, found {}", roots));
    }
    if graph.dfs().len() != graph.len() {
        problems.push("nodes unreachable from root".to_string());
    }
    problems
}
