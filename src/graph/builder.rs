//! Static command tables and graph construction.

use crate::error::GraphError;
use crate::graph::{CommandGraph, CommandNode, ContextType, NodeId, NodeKind};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub label: &'static str,
    pub aliases: &'static [&'static str],
    pub summary: &'static str,
}

const fn cmd(label: &'static str, summary: &'static str) -> CommandSpec {
    CommandSpec {
        label,
        aliases: &[],
        summary,
    }
}

const fn aliased(
    label: &'static str,
    aliases: &'static [&'static str],
    summary: &'static str,
) -> CommandSpec {
    CommandSpec {
        label,
        aliases,
        summary,
    }
}

/// Command table of one context.
#[derive(Debug, Clone, Copy)]
pub struct ContextSpec {
    pub context: ContextType,
    pub shows: &'static [CommandSpec],
    pub options: &'static [CommandSpec],
    pub children: &'static [ContextType],
    pub actions: &'static [CommandSpec],
}

const SCOPED_OPTIONS: &[CommandSpec] = &[
    cmd("no-cache", "Bypass the cache for reads (on|off)"),
    cmd("output-format", "Render output as table or json"),
    cmd("output-file", "Append rendered output to a file (off to stop)"),
    cmd("watch", "Re-run the next show every N seconds (off to stop)"),
];

const WRITE: CommandSpec = cmd("write", "Save the last output to a file");
const EXIT: CommandSpec = cmd("exit", "Leave the current context");
const END: CommandSpec = cmd("end", "Return to root");
const FIND_PREFIX: CommandSpec = cmd(
    "find_prefix",
    "Routes covering a prefix (--exact, --overlap)",
);
const FIND_NULL_ROUTES: CommandSpec = cmd("find_null_routes", "Blackhole routes in scope");
const TRACE: CommandSpec = cmd("trace", "Follow an address hop by hop");
const DETAIL: CommandSpec = cmd("detail", "Attributes of the current resource");
const ROUTE_TABLES: CommandSpec = aliased("route-tables", &["rtbs"], "Route tables owned here");
const BLACKHOLE_ROUTES: CommandSpec = cmd("blackhole-routes", "Blackhole routes in scope");

/// Command tables for every context the shell knows.
pub const STANDARD_CONTEXTS: &[ContextSpec] = &[
    ContextSpec {
        context: ContextType::Root,
        shows: &[
            cmd("version", "Shell version"),
            cmd("config", "Session options"),
            cmd("running-config", "Session options and context path"),
            cmd("cache", "Cache entries with age and TTL"),
            cmd("routing-cache", "Routing index summary"),
            cmd("graph", "Command graph statistics and fingerprint"),
            aliased("global-networks", &["gns"], "Cloud WAN global networks"),
            cmd("vpcs", "VPCs"),
            aliased("transit-gateways", &["tgws"], "Transit gateways"),
            cmd("firewalls", "Network firewalls"),
            aliased("ec2-instances", &["instances"], "EC2 instances"),
            cmd("elbs", "Load balancers"),
            cmd("vpns", "Site-to-site VPN connections"),
        ],
        options: &[
            cmd("profile", "Credentials profile"),
            cmd("regions", "Comma-separated regions (all to clear)"),
            cmd("cache-ttl", "Default cache TTL, e.g. 15m, 1h, 2d"),
            cmd("no-cache", "Bypass the cache for reads (on|off)"),
            cmd("output-format", "Render output as table or json"),
            cmd("output-file", "Append rendered output to a file (off to stop)"),
            cmd("watch", "Re-run the next show every N seconds (off to stop)"),
        ],
        children: &[
            ContextType::GlobalNetwork,
            ContextType::Vpc,
            ContextType::TransitGateway,
            ContextType::Firewall,
            ContextType::Ec2Instance,
            ContextType::Elb,
            ContextType::Vpn,
        ],
        actions: &[
            WRITE,
            cmd("trace", "Follow an address hop by hop (--from <resource>)"),
            cmd("find_ip", "Routes and interfaces matching an address"),
            FIND_PREFIX,
            FIND_NULL_ROUTES,
            cmd("populate_cache", "Fetch every listing into the cache"),
            cmd("clear_cache", "Drop cache entries (optionally by key prefix)"),
            cmd("create_routing_cache", "Build the sorted routing index"),
            cmd("validate_graph", "Report commands without a handler"),
            cmd("export_graph", "Render the command graph (text, markdown, mermaid)"),
            EXIT,
            END,
        ],
    },
    ContextSpec {
        context: ContextType::GlobalNetwork,
        shows: &[DETAIL, aliased("core-networks", &["cns"], "Core networks")],
        options: SCOPED_OPTIONS,
        children: &[ContextType::CoreNetwork],
        actions: &[WRITE, EXIT, END],
    },
    ContextSpec {
        context: ContextType::CoreNetwork,
        shows: &[
            DETAIL,
            cmd("segments", "Segments"),
            cmd("connect-peers", "Connect peers"),
            ROUTE_TABLES,
            BLACKHOLE_ROUTES,
        ],
        options: SCOPED_OPTIONS,
        children: &[ContextType::RouteTable],
        actions: &[FIND_PREFIX, FIND_NULL_ROUTES, WRITE, EXIT, END],
    },
    ContextSpec {
        context: ContextType::RouteTable,
        shows: &[
            DETAIL,
            cmd("routes", "Routes, longest prefix first"),
            cmd("associations", "Associated attachments"),
            cmd("propagations", "Propagating attachments"),
            BLACKHOLE_ROUTES,
        ],
        options: SCOPED_OPTIONS,
        children: &[],
        actions: &[FIND_PREFIX, FIND_NULL_ROUTES, TRACE, WRITE, EXIT, END],
    },
    ContextSpec {
        context: ContextType::Vpc,
        shows: &[
            DETAIL,
            cmd("subnets", "Subnets"),
            aliased("security-groups", &["sgs"], "Security groups"),
            cmd("nacls", "Network ACLs"),
            aliased("internet-gateways", &["igws"], "Internet gateways"),
            cmd("nat-gateways", "NAT gateways"),
            cmd("endpoints", "VPC endpoints"),
            ROUTE_TABLES,
        ],
        options: SCOPED_OPTIONS,
        children: &[ContextType::RouteTable],
        actions: &[FIND_PREFIX, FIND_NULL_ROUTES, TRACE, WRITE, EXIT, END],
    },
    ContextSpec {
        context: ContextType::TransitGateway,
        shows: &[
            DETAIL,
            cmd("attachments", "Attachments"),
            ROUTE_TABLES,
            BLACKHOLE_ROUTES,
        ],
        options: SCOPED_OPTIONS,
        children: &[ContextType::RouteTable],
        actions: &[FIND_PREFIX, FIND_NULL_ROUTES, WRITE, EXIT, END],
    },
    ContextSpec {
        context: ContextType::Firewall,
        shows: &[DETAIL, cmd("rule-groups", "Rule groups")],
        options: SCOPED_OPTIONS,
        children: &[],
        actions: &[WRITE, EXIT, END],
    },
    ContextSpec {
        context: ContextType::Ec2Instance,
        shows: &[
            DETAIL,
            aliased("enis", &["network-interfaces"], "Network interfaces"),
            aliased("security-groups", &["sgs"], "Security groups attached to the instance"),
        ],
        options: SCOPED_OPTIONS,
        children: &[],
        actions: &[WRITE, EXIT, END],
    },
    ContextSpec {
        context: ContextType::Elb,
        shows: &[
            DETAIL,
            cmd("listeners", "Listeners"),
            cmd("targets", "Target groups"),
        ],
        options: SCOPED_OPTIONS,
        children: &[],
        actions: &[WRITE, EXIT, END],
    },
    ContextSpec {
        context: ContextType::Vpn,
        shows: &[DETAIL, cmd("tunnels", "Tunnels")],
        options: SCOPED_OPTIONS,
        children: &[],
        actions: &[WRITE, EXIT, END],
    },
];

/// Entry aliases typed after `set`.
fn entry_aliases(context: ContextType) -> Vec<String> {
    match context {
        ContextType::TransitGateway => vec!["tgw".to_string()],
        ContextType::RouteTable => vec!["rtb".to_string()],
        ContextType::Ec2Instance => vec!["instance".to_string()],
        _ => Vec::new(),
    }
}

struct Builder<'a> {
    specs: &'a [ContextSpec],
    nodes: Vec<CommandNode>,
    by_path: HashMap<String, NodeId>,
}

impl Builder<'_> {
    fn spec(&self, context: ContextType) -> Result<&ContextSpec, GraphError> {
        self.specs
            .iter()
            .find(|s| s.context == context)
            .ok_or_else(|| GraphError::MissingContext(context.name().to_string()))
    }

    #[allow(clippy::too_many_arguments)]
    fn add(
        &mut self,
        parent: Option<NodeId>,
        path: String,
        kind: NodeKind,
        label: &str,
        aliases: Vec<String>,
        summary: &str,
        context: ContextType,
        enters: Option<ContextType>,
    ) -> Result<NodeId, GraphError> {
        if self.by_path.contains_key(&path) {
            return Err(GraphError::DuplicatePath(path));
        }
        let id = self.nodes.len();
        self.by_path.insert(path.clone(), id);
        self.nodes.push(CommandNode {
            path,
            kind,
            label: label.to_string(),
            aliases,
            summary: summary.to_string(),
            context,
            enters,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        Ok(id)
    }

    fn instantiate(
        &mut self,
        context: ContextType,
        scope: NodeId,
        visiting: &mut Vec<ContextType>,
    ) -> Result<(), GraphError> {
        if visiting.contains(&context) {
            return Err(GraphError::Cycle(context.name().to_string()));
        }
        visiting.push(context);
        let spec = *self.spec(context)?;
        let base = self.nodes[scope].path.clone();

        for show in spec.shows {
            self.add_command(scope, &base, NodeKind::Show, show, context)?;
        }
        for option in spec.options {
            self.add_command(scope, &base, NodeKind::Set, option, context)?;
        }
        for child in spec.children {
            if !child.entered_from().contains(&context) {
                return Err(GraphError::IllegalEntry {
                    parent: context.name().to_string(),
                    child: child.name().to_string(),
                });
            }
            let id = self.add(
                Some(scope),
                format!("{}.{}", base, child.name()),
                NodeKind::ContextEntry,
                child.name(),
                entry_aliases(*child),
                &format!("Enter a {} context", child.name()),
                context,
                Some(*child),
            )?;
            self.instantiate(*child, id, visiting)?;
        }
        for action in spec.actions {
            self.add_command(scope, &base, NodeKind::Action, action, context)?;
        }

        visiting.pop();
        Ok(())
    }

    fn add_command(
        &mut self,
        scope: NodeId,
        base: &str,
        kind: NodeKind,
        spec: &CommandSpec,
        context: ContextType,
    ) -> Result<NodeId, GraphError> {
        let path = match kind {
            NodeKind::Show => format!("{}.show.{}", base, spec.label),
            NodeKind::Set => format!("{}.set.{}", base, spec.label),
            _ => format!("{}.{}", base, spec.label),
        };
        self.add(
            Some(scope),
            path,
            kind,
            spec.label,
            spec.aliases.iter().map(|a| a.to_string()).collect(),
            spec.summary,
            context,
            None,
        )
    }
}

impl CommandGraph {
    /// Graph over the shell's built-in command tables.
    pub fn standard() -> Result<Self, GraphError> {
        Self::build(STANDARD_CONTEXTS)
    }

    pub fn build(specs: &[ContextSpec]) -> Result<Self, GraphError> {
        let mut builder = Builder {
            specs,
            nodes: Vec::new(),
            by_path: HashMap::new(),
        };
        builder.spec(ContextType::Root)?;
        let root = builder.add(
            None,
            "root".to_string(),
            NodeKind::Root,
            "root",
            Vec::new(),
            "Top level",
            ContextType::Root,
            Some(ContextType::Root),
        )?;
        builder.instantiate(ContextType::Root, root, &mut Vec::new())?;
        Ok(CommandGraph::from_parts(builder.nodes, builder.by_path))
    }
}
