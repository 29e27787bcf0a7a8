//! Deterministic renderings of the command graph.

use crate::graph::{CommandGraph, CommandNode, NodeKind};
use std::fmt::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Text,
    Markdown,
    Mermaid,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Text => "text",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Mermaid => "mermaid",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "mermaid" | "mmd" => Ok(ExportFormat::Mermaid),
            other => Err(format!(
                "unknown export format '{}' (expected text, markdown or mermaid)",
                other
            )),
        }
    }
}

fn display(node: &CommandNode) -> String {
    match node.kind {
        NodeKind::Root => "root".to_string(),
        NodeKind::ContextEntry => format!("set {} <selector>", node.label),
        NodeKind::Set => format!("set {} <value>", node.label),
        NodeKind::Show | NodeKind::Action => node.phrase(),
    }
}

pub fn export_graph(graph: &CommandGraph, format: ExportFormat) -> String {
    let mut out = String::new();
    match format {
        ExportFormat::Text => {
            for id in graph.dfs() {
                let node = graph.node(id);
                let _ = writeln!(
                    out,
                    "{}{} [{}]",
                    "  ".repeat(graph.depth(id)),
                    display(node),
                    node.kind.as_str()
                );
            }
        }
        ExportFormat::Markdown => {
            let _ = writeln!(out, "# Command graph\n");
            for id in graph.dfs().into_iter().skip(1) {
                let node = graph.node(id);
                let _ = write!(
                    out,
                    "{}- `{}`",
                    "  ".repeat(graph.depth(id) - 1),
                    display(node)
                );
                if node.summary.is_empty() {
                    out.push('\n');
                } else {
                    let _ = writeln!(out, ": {}", node.summary);
                }
            }
        }
        ExportFormat::Mermaid => {
            out.push_str("flowchart TD\n");
            for id in graph.dfs() {
                let node = graph.node(id);
                let label = display(node).replace('"', "'").replace('<', "&lt;").replace('>', "&gt;");
                let _ = writeln!(out, "    n{}[\"{}\"]", id, label);
            }
            for id in graph.dfs() {
                for child in &graph.node(id).children {
                    let _ = writeln!(out, "    n{} --> n{}", id, child);
                }
            }
        }
    }
    out
}

/// blake3 hex digest of the text export.
pub fn fingerprint(graph: &CommandGraph) -> String {
    hex::encode(blake3::hash(export_graph(graph, ExportFormat::Text).as_bytes()).as_bytes())
}
