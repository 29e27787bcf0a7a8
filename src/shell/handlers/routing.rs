//! find_prefix, find_null_routes, find_ip and trace.

use crate::error::ShellError;
use crate::graph::ContextType;
use crate::routing::{
    find_ip, find_null_routes, find_prefix, parse_prefix, tables_in_scope, trace, PrefixMode,
    RoutingIndex, TableSet, TraceOutcome, TraceResult,
};
use crate::shell::handlers::{CommandHandler, CommandOutcome, HandlerCtx};
use crate::shell::output::CommandOutput;
use crate::shell::parse::ParsedArgs;
use crate::types::{value_text, ResourceKind, ResourceRecord};
use async_trait::async_trait;
use std::net::IpAddr;

fn scope_title(ctx: &HandlerCtx<'_>) -> String {
    match ctx.stack.scope_id() {
        Some(id) => format!("{} {}", ctx.frame().context, id),
        None => "all route tables".to_string(),
    }
}

/// `find_prefix <cidr> [--exact | --overlap]`
pub struct FindPrefix;

#[async_trait]
impl CommandHandler for FindPrefix {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        let args = ParsedArgs::parse(ctx.args, &[])?;
        args.only(&["exact", "overlap"], ctx.input)?;
        let [cidr] = args.positional.as_slice() else {
            return Err(ShellError::invalid_argument(
                "usage: find_prefix <cidr> [--exact | --overlap]",
                ctx.input,
            ));
        };
        let mode = match (args.has("exact"), args.has("overlap")) {
            (true, true) => {
                return Err(ShellError::invalid_argument(
                    "--exact and --overlap are mutually exclusive",
                    ctx.input,
                ))
            }
            (true, false) => PrefixMode::Exact,
            (false, true) => PrefixMode::Overlapping,
            (false, false) => PrefixMode::Covering,
        };
        let query = parse_prefix(cidr)?;

        let tables = tables_in_scope(&ctx.inventory, ctx.frame(), ctx.input).await?;
        let views = RoutingIndex::new(&ctx.inventory).views(&tables);
        let matches = find_prefix(&views, &query, mode);
        if matches.is_empty() {
            return Err(ShellError::not_found(
                format!("no route for {} in {}", query, scope_title(ctx)),
                ctx.input,
            ));
        }
        Ok(CommandOutcome::output(CommandOutput::Routes {
            title: format!("Routes matching {} in {}", query, scope_title(ctx)),
            matches,
        }))
    }
}

/// `find_null_routes`, also bound to `show blackhole-routes`.
pub struct FindNullRoutes;

#[async_trait]
impl CommandHandler for FindNullRoutes {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        ctx.no_args()?;
        let tables = tables_in_scope(&ctx.inventory, ctx.frame(), ctx.input).await?;
        let views = RoutingIndex::new(&ctx.inventory).views(&tables);
        let matches = find_null_routes(&views);
        if matches.is_empty() {
            return Ok(CommandOutcome::output(CommandOutput::message(format!(
                "No blackhole routes in {}",
                scope_title(ctx)
            ))));
        }
        Ok(CommandOutcome::output(CommandOutput::Routes {
            title: format!("Blackhole routes in {}", scope_title(ctx)),
            matches,
        }))
    }
}

fn interface_has_ip(record: &ResourceRecord, ip: &IpAddr) -> bool {
    let wanted = ip.to_string();
    let single = record
        .attribute_text("private_ip")
        .map(|v| v == wanted)
        .unwrap_or(false);
    let listed = record
        .raw_attributes
        .get("private_ips")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().any(|v| value_text(v) == wanted))
        .unwrap_or(false);
    single || listed
}

/// `find_ip <address>`: covering routes in every table plus interfaces holding it.
pub struct FindIp;

#[async_trait]
impl CommandHandler for FindIp {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        let [address] = ctx.args else {
            return Err(ShellError::invalid_argument("usage: find_ip <address>", ctx.input));
        };
        let ip: IpAddr = address
            .parse()
            .map_err(|_| ShellError::invalid_argument("not a valid IP address", ctx.input))?;

        let tables = ctx
            .inventory
            .route_tables(None)
            .await
            .map_err(|e| ctx.inventory_error(e))?;
        let views = RoutingIndex::new(&ctx.inventory).views(&tables);
        let matches = find_ip(&views, ip);

        let interfaces: Vec<ResourceRecord> = ctx
            .inventory
            .list(ResourceKind::NetworkInterface, None)
            .await
            .map_err(|e| ctx.inventory_error(e))?
            .into_iter()
            .filter(|r| interface_has_ip(r, &ip))
            .collect();

        if matches.is_empty() && interfaces.is_empty() {
            return Err(ShellError::not_found(
                format!("no route or interface matches {}", ip),
                ctx.input,
            ));
        }
        Ok(CommandOutcome::output(CommandOutput::Sections {
            sections: vec![
                CommandOutput::Routes {
                    title: format!("Routes covering {}", ip),
                    matches,
                },
                CommandOutput::Records {
                    title: format!("Interfaces with {}", ip),
                    kind: ResourceKind::NetworkInterface,
                    records: interfaces,
                },
            ],
        }))
    }
}

/// `trace <ip|cidr> [--from <resource>]`
pub struct Trace;

#[async_trait]
impl CommandHandler for Trace {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        let args = ParsedArgs::parse(ctx.args, &["from"])?;
        args.only(&["from"], ctx.input)?;
        let [destination] = args.positional.as_slice() else {
            return Err(ShellError::invalid_argument(
                "usage: trace <ip|cidr> [--from <resource>]",
                ctx.input,
            ));
        };
        let destination = parse_prefix(destination)?;

        let start = match (args.value("from"), ctx.frame().context) {
            (Some(from), _) => from.to_string(),
            (None, ContextType::Root) => {
                return Err(ShellError::invalid_argument(
                    "at root, trace needs --from <route-table|vpc|attachment>",
                    ctx.input,
                ))
            }
            (None, _) => ctx
                .stack
                .scope_id()
                .map(str::to_string)
                .ok_or_else(|| ShellError::invalid_argument("no trace start", ctx.input))?,
        };

        let tables = ctx
            .inventory
            .route_tables(None)
            .await
            .map_err(|e| ctx.inventory_error(e))?;
        let set = TableSet::new(tables);
        let entry = set.entry_table_for(&start).ok_or_else(|| {
            ShellError::not_found(format!("no route table to start from for {}", start), ctx.input)
        })?;
        let result = trace(&set, entry, destination);
        outcome_to_result(result, ctx.input)
    }
}

fn outcome_to_result(result: TraceResult, input: &str) -> Result<CommandOutcome, ShellError> {
    let path = result.path();
    match &result.outcome {
        TraceOutcome::Delivered { .. } | TraceOutcome::Blackholed { .. } => {
            Ok(CommandOutcome::output(CommandOutput::Trace { result }))
        }
        TraceOutcome::Unreachable { route_table_id } => Err(ShellError::unreachable(
            format!(
                "no route to {} in {} (path: {})",
                result.destination, route_table_id, path
            ),
            input,
        )),
        TraceOutcome::RoutingLoopDetected { route_table_id } => Err(ShellError::routing_loop(
            format!("revisited {} (path: {})", route_table_id, path),
            input,
        )),
        TraceOutcome::AmbiguousRoute {
            route_table_id,
            candidates,
        } => {
            let targets: Vec<String> = candidates
                .iter()
                .map(|r| format!("{} -> {} {}", r.destination, r.target_kind, r.target_id))
                .collect();
            Err(ShellError::ambiguous_route(
                format!(
                    "equal-length routes in {}: {} (path: {})",
                    route_table_id,
                    targets.join("; "),
                    path
                ),
                input,
            ))
        }
    }
}
