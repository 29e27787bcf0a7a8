//! Line dispatch: resolve against the top frame, run, then apply the stack change.

use crate::error::{GraphError, ShellError};
use crate::graph::{CommandGraph, CommandNode, NodeKind, Resolution};
use crate::shell::handlers::{HandlerCtx, HandlerRegistry, Transition};
use crate::shell::navigation;
use crate::shell::output::CommandOutput;
use crate::shell::parse::split_line;
use crate::shell::session::Session;
use std::sync::Arc;
use tracing::debug;

/// Actions that only read state and may be repeated by watch mode.
const READ_ONLY_ACTIONS: &[&str] = &["find_ip", "find_prefix", "find_null_routes", "trace"];

/// Shared, immutable command graph and handler registry.
#[derive(Clone)]
pub struct Dispatcher {
    graph: Arc<CommandGraph>,
    registry: Arc<HandlerRegistry>,
}

impl Dispatcher {
    pub fn new(graph: CommandGraph, registry: HandlerRegistry) -> Self {
        Self {
            graph: Arc::new(graph),
            registry: Arc::new(registry),
        }
    }

    /// The built-in graph with every built-in handler bound.
    pub fn standard() -> Result<Self, GraphError> {
        let graph = CommandGraph::standard()?;
        let registry = HandlerRegistry::standard(&graph);
        Ok(Self::new(graph, registry))
    }

    pub fn graph(&self) -> &CommandGraph {
        &self.graph
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Resolve `line` in the session's current context without running it.
    ///
    /// Returns `None` for empty lines and shell built-ins (`help`, bare `show`/`set`).
    pub fn resolve_line(
        &self,
        session: &Session,
        line: &str,
    ) -> Result<Option<(&CommandNode, Resolution)>, ShellError> {
        let tokens = split_line(line)?;
        if tokens.is_empty() || builtin(&tokens).is_some() {
            return Ok(None);
        }
        let resolution = self.graph.resolve(&session.stack.top().node_path, &tokens)?;
        Ok(Some((self.graph.node(resolution.node), resolution)))
    }

    /// Whether `node` may be repeated by `set watch`.
    pub fn watchable(node: &CommandNode) -> bool {
        match node.kind {
            NodeKind::Show => true,
            NodeKind::Action => READ_ONLY_ACTIONS.contains(&node.label.as_str()),
            _ => false,
        }
    }

    /// Run one line against `session`.
    ///
    /// On error the session is unchanged: handlers request stack changes and the
    /// dispatcher applies them only after success.
    pub async fn execute(&self, session: &mut Session, line: &str) -> Result<CommandOutput, ShellError> {
        let result = self.run_line(session, line).await;
        match &result {
            Ok(output) if output.is_data() => session.last_output = Some(output.clone()),
            Ok(_) => {}
            Err(e) => debug!(line, kind = e.kind(), error = %e, "Command failed"),
        }
        result
    }

    async fn run_line(&self, session: &mut Session, line: &str) -> Result<CommandOutput, ShellError> {
        let tokens = split_line(line)?;
        if tokens.is_empty() {
            return Ok(CommandOutput::Empty);
        }
        if let Some(filter) = builtin(&tokens) {
            return Ok(self.help(session, filter));
        }

        let input = line.trim();
        let resolution = self.graph.resolve(&session.stack.top().node_path, &tokens)?;
        let node = self.graph.node(resolution.node);
        debug!(path = %node.path, args = ?resolution.args, "Resolved command");

        if node.kind == NodeKind::ContextEntry {
            return navigation::enter(session, node, &resolution.args, input).await;
        }

        let handler = self.registry.get(&node.path).ok_or_else(|| {
            ShellError::not_implemented(format!("no handler for {}", node.path), input)
        })?;

        let inventory = session.inventory();
        let outcome = {
            let mut ctx = HandlerCtx {
                stack: &session.stack,
                options: &mut session.options,
                pins: &mut session.pins,
                inventory,
                graph: &self.graph,
                registry: &self.registry,
                last_output: session.last_output.as_ref(),
                node,
                args: &resolution.args,
                input,
            };
            handler.run(&mut ctx).await?
        };

        match outcome.transition {
            Some(Transition::Pop) => {
                session.stack.pop()?;
            }
            Some(Transition::PopToRoot) => session.stack.pop_to_root(),
            Some(Transition::RefreshDetail(detail)) => session.stack.refresh_top_detail(detail),
            None => {}
        }
        Ok(outcome.output)
    }

    /// Commands available in the current context, optionally only one kind.
    fn help(&self, session: &Session, filter: HelpFilter) -> CommandOutput {
        let frame = session.stack.top();
        let rows = self
            .graph
            .find(&frame.node_path)
            .map(|scope| {
                self.graph
                    .children(scope)
                    .filter(|node| filter.admits(node.kind))
                    .map(|node| {
                        let usage = match node.kind {
                            NodeKind::ContextEntry => format!("set {} <selector>", node.label),
                            NodeKind::Set => format!("set {} <value>", node.label),
                            _ => node.phrase(),
                        };
                        vec![usage, node.aliases.join(", "), node.summary.clone()]
                    })
                    .collect()
            })
            .unwrap_or_default();
        let context = if frame.is_root() {
            "root".to_string()
        } else {
            frame.display()
        };
        CommandOutput::Table {
            title: format!("Commands in {}", context),
            headers: vec!["Command".to_string(), "Aliases".to_string(), "Summary".to_string()],
            rows,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HelpFilter {
    All,
    Show,
    Set,
}

impl HelpFilter {
    fn admits(&self, kind: NodeKind) -> bool {
        match self {
            HelpFilter::All => true,
            HelpFilter::Show => kind == NodeKind::Show,
            HelpFilter::Set => matches!(kind, NodeKind::Set | NodeKind::ContextEntry),
        }
    }
}

fn builtin(tokens: &[String]) -> Option<HelpFilter> {
    match tokens {
        [word] => match word.to_ascii_lowercase().as_str() {
            "help" | "?" => Some(HelpFilter::All),
            "show" => Some(HelpFilter::Show),
            "set" => Some(HelpFilter::Set),
            _ => None,
        },
        _ => None,
    }
}
