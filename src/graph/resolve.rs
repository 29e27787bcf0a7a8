//! Resolving typed tokens to a command node.

use crate::error::ShellError;
use crate::graph::{CommandGraph, CommandNode, ContextType, NodeId, NodeKind};

/// Lowercase, with underscores folded to hyphens.
pub fn normalize_token(token: &str) -> String {
    token.to_ascii_lowercase().replace('_', "-")
}

/// A matched command and the tokens left over as its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub node: NodeId,
    pub args: Vec<String>,
}

fn phrases(node: &CommandNode) -> Vec<Vec<String>> {
    let verb = match node.kind {
        NodeKind::Root => return Vec::new(),
        NodeKind::Show => Some("show"),
        NodeKind::Set | NodeKind::ContextEntry => Some("set"),
        NodeKind::Action => None,
    };
    std::iter::once(&node.label)
        .chain(node.aliases.iter())
        .map(|word| {
            verb.into_iter()
                .map(str::to_string)
                .chain(word.split_whitespace().map(normalize_token))
                .collect()
        })
        .collect()
}

/// Length of the longest phrase of `node` that prefixes `tokens`.
fn match_len(node: &CommandNode, tokens: &[String]) -> Option<usize> {
    phrases(node)
        .into_iter()
        .filter(|phrase| {
            phrase.len() <= tokens.len()
                && phrase.iter().zip(tokens).all(|(p, t)| *p == normalize_token(t))
        })
        .map(|phrase| phrase.len())
        .max()
}

impl CommandGraph {
    /// Resolve `tokens` among the commands of the scope node at `scope`.
    ///
    /// Only that scope's own commands are considered. A command that exists under some
    /// other context is an `InvalidTransition`; one that exists nowhere is `NotFound`.
    pub fn resolve_at(&self, scope: NodeId, tokens: &[String]) -> Result<Resolution, ShellError> {
        let input = tokens.join(" ");
        if tokens.is_empty() {
            return Err(ShellError::not_found("empty command", input));
        }

        let best = self
            .node(scope)
            .children
            .iter()
            .filter_map(|id| match_len(self.node(*id), tokens).map(|len| (*id, len)))
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)));

        if let Some((node, len)) = best {
            return Ok(Resolution {
                node,
                args: tokens[len..].to_vec(),
            });
        }

        let context = self.node(scope).scope_context();
        let mut elsewhere: Vec<ContextType> = self
            .nodes()
            .iter()
            .filter(|n| match_len(n, tokens).is_some())
            .map(|n| n.context)
            .collect();
        elsewhere.sort();
        elsewhere.dedup();

        if elsewhere.is_empty() {
            Err(ShellError::not_found(
                format!("unknown command '{}' (try `help`)", input),
                input,
            ))
        } else {
            let names: Vec<&str> = elsewhere.iter().map(|c| c.name()).collect();
            Err(ShellError::invalid_transition(
                format!(
                    "'{}' is not available in {} context (available in: {})",
                    input,
                    context,
                    names.join(", ")
                ),
                input,
            ))
        }
    }

    /// Resolve against the scope node at `scope_path`.
    pub fn resolve(&self, scope_path: &str, tokens: &[String]) -> Result<Resolution, ShellError> {
        let scope = self.find(scope_path).ok_or_else(|| {
            ShellError::not_found(format!("no command scope at {}", scope_path), scope_path)
        })?;
        self.resolve_at(scope, tokens)
    }
}
