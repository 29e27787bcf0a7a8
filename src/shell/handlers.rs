//! Command handlers and the registry binding them to graph paths.

pub mod cache;
pub mod graph;
pub mod navigation;
pub mod options;
pub mod resources;
pub mod routing;

use crate::context::{ContextFrame, ContextStack, FrameDetail, SelectionPins};
use crate::error::ShellError;
use crate::graph::{CommandGraph, CommandNode, ContextType, HandlerLookup, NodeKind};
use crate::inventory::CachedInventory;
use crate::shell::output::CommandOutput;
use crate::shell::session::SessionOptions;
use crate::types::ResourceKind;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Stack change requested by a handler, applied by the dispatcher after it succeeds.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Pop,
    PopToRoot,
    RefreshDetail(FrameDetail),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub output: CommandOutput,
    pub transition: Option<Transition>,
}

impl CommandOutcome {
    pub fn output(output: CommandOutput) -> Self {
        Self {
            output,
            transition: None,
        }
    }

    pub fn with_transition(output: CommandOutput, transition: Transition) -> Self {
        Self {
            output,
            transition: Some(transition),
        }
    }
}

/// Everything a handler may read or change.
///
/// The stack is read-only here; handlers ask for stack changes through
/// `CommandOutcome::transition`.
pub struct HandlerCtx<'a> {
    pub stack: &'a ContextStack,
    pub options: &'a mut SessionOptions,
    pub pins: &'a mut SelectionPins,
    pub inventory: CachedInventory,
    pub graph: &'a CommandGraph,
    pub registry: &'a HandlerRegistry,
    pub last_output: Option<&'a CommandOutput>,
    pub node: &'a CommandNode,
    pub args: &'a [String],
    pub input: &'a str,
}

impl HandlerCtx<'_> {
    pub fn frame(&self) -> &ContextFrame {
        self.stack.top()
    }

    /// Resource id of the frame that pushed the top frame.
    pub fn parent_scope_id(&self) -> Option<&str> {
        let parent = self.frame().parent?;
        self.stack.frames().get(parent)?.resource_id.as_deref()
    }

    pub fn no_args(&self) -> Result<(), ShellError> {
        if self.args.is_empty() {
            Ok(())
        } else {
            Err(ShellError::invalid_argument(
                format!("`{}` takes no arguments", self.node.phrase()),
                self.input,
            ))
        }
    }

    pub fn inventory_error(&self, err: crate::error::InventoryError) -> ShellError {
        ShellError::from_inventory(err, self.input)
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError>;
}

/// Map from command path to handler.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn CommandHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the built-in handler for every show, set and action node of `graph`.
    pub fn standard(graph: &CommandGraph) -> Self {
        let mut registry = Self::new();
        for id in graph.dfs() {
            let node = graph.node(id);
            if let Some(handler) = builtin_handler(node) {
                registry.register(node.path.clone(), handler);
            }
        }
        registry
    }

    pub fn register(&mut self, path: impl Into<String>, handler: Arc<dyn CommandHandler>) {
        self.handlers.insert(path.into(), handler);
    }

    pub fn unregister(&mut self, path: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.remove(path)
    }

    pub fn get(&self, path: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl HandlerLookup for HandlerRegistry {
    fn has_handler(&self, path: &str) -> bool {
        self.handlers.contains_key(path)
    }
}

/// Resource kind listed by a `show` noun.
fn listed_kind(label: &str) -> Option<ResourceKind> {
    let kind = match label {
        "global-networks" => ResourceKind::GlobalNetwork,
        "core-networks" => ResourceKind::CoreNetwork,
        "segments" => ResourceKind::Segment,
        "connect-peers" => ResourceKind::ConnectPeer,
        "vpcs" => ResourceKind::Vpc,
        "subnets" => ResourceKind::Subnet,
        "nacls" => ResourceKind::NetworkAcl,
        "internet-gateways" => ResourceKind::InternetGateway,
        "nat-gateways" => ResourceKind::NatGateway,
        "endpoints" => ResourceKind::VpcEndpoint,
        "transit-gateways" => ResourceKind::TransitGateway,
        "attachments" => ResourceKind::Attachment,
        "route-tables" => ResourceKind::RouteTable,
        "firewalls" => ResourceKind::Firewall,
        "rule-groups" => ResourceKind::RuleGroup,
        "ec2-instances" => ResourceKind::Ec2Instance,
        "enis" => ResourceKind::NetworkInterface,
        "elbs" => ResourceKind::Elb,
        "listeners" => ResourceKind::Listener,
        "targets" => ResourceKind::TargetGroup,
        "vpns" => ResourceKind::Vpn,
        "tunnels" => ResourceKind::Tunnel,
        _ => return None,
    };
    Some(kind)
}

fn builtin_handler(node: &CommandNode) -> Option<Arc<dyn CommandHandler>> {
    let label = node.label.as_str();
    let handler: Arc<dyn CommandHandler> = match node.kind {
        NodeKind::Root | NodeKind::ContextEntry => return None,
        NodeKind::Set => Arc::new(options::SetOption),
        NodeKind::Show => match (node.context, label) {
            (_, "version") => Arc::new(options::ShowVersion),
            (_, "config") => Arc::new(options::ShowConfig { running: false }),
            (_, "running-config") => Arc::new(options::ShowConfig { running: true }),
            (_, "cache") => Arc::new(cache::ShowCache),
            (_, "routing-cache") => Arc::new(cache::ShowRoutingCache),
            (_, "graph") => Arc::new(graph::ShowGraph),
            (_, "detail") => Arc::new(resources::ShowDetail),
            (_, "blackhole-routes") => Arc::new(routing::FindNullRoutes),
            (ContextType::RouteTable, "routes") => Arc::new(resources::ShowRoutes),
            (ContextType::RouteTable, "associations") => {
                Arc::new(resources::ShowTableEdges { propagations: false })
            }
            (ContextType::RouteTable, "propagations") => {
                Arc::new(resources::ShowTableEdges { propagations: true })
            }
            (ContextType::Ec2Instance, "security-groups") => Arc::new(resources::ShowReferenced {
                kind: ResourceKind::SecurityGroup,
                attribute: "security_groups",
            }),
            (ContextType::Vpc, "security-groups") => Arc::new(resources::ListResources {
                kind: ResourceKind::SecurityGroup,
            }),
            (_, noun) => Arc::new(resources::ListResources {
                kind: listed_kind(noun)?,
            }),
        },
        NodeKind::Action => match label {
            "write" => Arc::new(navigation::WriteOutput),
            "exit" => Arc::new(navigation::Exit),
            "end" => Arc::new(navigation::End),
            "trace" => Arc::new(routing::Trace),
            "find_ip" => Arc::new(routing::FindIp),
            "find_prefix" => Arc::new(routing::FindPrefix),
            "find_null_routes" => Arc::new(routing::FindNullRoutes),
            "populate_cache" => Arc::new(cache::PopulateCache),
            "clear_cache" => Arc::new(cache::ClearCache),
            "create_routing_cache" => Arc::new(cache::CreateRoutingCache),
            "validate_graph" => Arc::new(graph::ValidateGraph),
            "export_graph" => Arc::new(graph::ExportGraph),
            _ => return None,
        },
    };
    Some(handler)
}
