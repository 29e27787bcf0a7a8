//! Cache inspection and warming.

use crate::cache::format_ttl;
use crate::error::{InventoryError, ShellError};
use crate::routing::RoutingIndex;
use crate::shell::handlers::{CommandHandler, CommandOutcome, HandlerCtx};
use crate::shell::output::CommandOutput;
use crate::types::ResourceKind;
use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, warn};

const TOP_LEVEL: &[ResourceKind] = &[
    ResourceKind::GlobalNetwork,
    ResourceKind::CoreNetwork,
    ResourceKind::Vpc,
    ResourceKind::TransitGateway,
    ResourceKind::Firewall,
    ResourceKind::Ec2Instance,
    ResourceKind::NetworkInterface,
    ResourceKind::Elb,
    ResourceKind::Vpn,
];

const VPC_CHILDREN: &[ResourceKind] = &[
    ResourceKind::Subnet,
    ResourceKind::SecurityGroup,
    ResourceKind::NetworkAcl,
    ResourceKind::InternetGateway,
    ResourceKind::NatGateway,
    ResourceKind::VpcEndpoint,
];

fn human_age(age: std::time::Duration) -> String {
    let secs = age.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    }
}

pub struct ShowCache;

#[async_trait]
impl CommandHandler for ShowCache {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        ctx.no_args()?;
        let cache = ctx.inventory.cache();
        let now = cache.now();
        let entries = cache.entries();
        let stats = cache.stats();
        let rows = entries
            .iter()
            .map(|entry| {
                vec![
                    entry.key.to_string(),
                    human_age(entry.age(now)),
                    format_ttl(entry.ttl),
                    if entry.is_expired(now) { "yes" } else { "no" }.to_string(),
                ]
            })
            .collect();
        Ok(CommandOutcome::output(CommandOutput::Sections {
            sections: vec![
                CommandOutput::Table {
                    title: format!("Cache ({} entries)", entries.len()),
                    headers: vec![
                        "Key".to_string(),
                        "Age".to_string(),
                        "TTL".to_string(),
                        "Expired".to_string(),
                    ],
                    rows,
                },
                CommandOutput::Detail {
                    title: "Statistics".to_string(),
                    fields: vec![
                        ("hits".to_string(), stats.hits.to_string()),
                        ("misses".to_string(), stats.misses.to_string()),
                        ("fetches".to_string(), stats.fetches.to_string()),
                        ("coalesced".to_string(), stats.coalesced.to_string()),
                        ("retries".to_string(), stats.retries.to_string()),
                        ("default-ttl".to_string(), format_ttl(cache.default_ttl())),
                    ],
                },
            ],
        }))
    }
}

pub struct ShowRoutingCache;

#[async_trait]
impl CommandHandler for ShowRoutingCache {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        ctx.no_args()?;
        let summary = RoutingIndex::new(&ctx.inventory).summary();
        if summary.is_empty() {
            return Ok(CommandOutcome::output(CommandOutput::message(
                "Routing cache is empty; run create_routing_cache",
            )));
        }
        let rows = summary
            .iter()
            .map(|s| {
                vec![
                    s.route_table_id.clone(),
                    s.owner_id.clone(),
                    s.routes.to_string(),
                    s.blackholes.to_string(),
                    human_age(s.age),
                    if s.expired { "yes" } else { "no" }.to_string(),
                ]
            })
            .collect();
        Ok(CommandOutcome::output(CommandOutput::Table {
            title: format!("Routing cache ({} tables)", summary.len()),
            headers: ["Route table", "Owner", "Routes", "Blackholes", "Age", "Expired"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows,
        }))
    }
}

/// Fetch every top-level listing, every route table and the per-VPC listings.
///
/// Listings run in parallel; duplicate keys share the cache's in-flight fetch.
pub struct PopulateCache;

#[async_trait]
impl CommandHandler for PopulateCache {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        ctx.no_args()?;
        let inventory = ctx.inventory.with_bypass(false);

        let top = join_all(TOP_LEVEL.iter().map(|kind| inventory.list(*kind, None))).await;
        let mut rows = Vec::new();
        let mut failures: Vec<InventoryError> = Vec::new();
        let mut vpc_ids = Vec::new();
        let mut tgw_ids = Vec::new();
        for (kind, result) in TOP_LEVEL.iter().zip(top) {
            match result {
                Ok(records) => {
                    let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
                    match kind {
                        ResourceKind::Vpc => vpc_ids = ids,
                        ResourceKind::TransitGateway => tgw_ids = ids,
                        _ => {}
                    }
                    rows.push(vec![kind.to_string(), records.len().to_string()]);
                }
                Err(e) => failures.push(e),
            }
        }

        let child_requests: Vec<(ResourceKind, &str)> = vpc_ids
            .iter()
            .flat_map(|vpc| VPC_CHILDREN.iter().map(move |kind| (*kind, vpc.as_str())))
            .chain(
                tgw_ids
                    .iter()
                    .map(|tgw| (ResourceKind::Attachment, tgw.as_str())),
            )
            .collect();
        let children = join_all(
            child_requests
                .iter()
                .map(|(kind, vpc)| inventory.list(*kind, Some(vpc))),
        )
        .await;
        let mut child_count = 0;
        for result in children {
            match result {
                Ok(records) => child_count += records.len(),
                Err(e) => failures.push(e),
            }
        }
        rows.push(vec!["children".to_string(), child_count.to_string()]);

        match inventory.route_tables(None).await {
            Ok(tables) => rows.push(vec!["route-table".to_string(), tables.len().to_string()]),
            Err(e) => failures.push(e),
        }

        if let Some(first) = failures.first() {
            warn!(failures = failures.len(), "populate_cache finished with errors");
            return Err(ShellError::from_inventory(first.clone(), ctx.input));
        }
        info!(entries = inventory.cache().len(), "Cache populated");
        Ok(CommandOutcome::output(CommandOutput::Table {
            title: format!("Cache populated ({} entries)", inventory.cache().len()),
            headers: vec!["Kind".to_string(), "Count".to_string()],
            rows,
        }))
    }
}

/// `clear_cache [key-prefix]`
pub struct ClearCache;

#[async_trait]
impl CommandHandler for ClearCache {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        let cache = ctx.inventory.cache();
        let removed = match ctx.args {
            [] => cache.clear_all()?,
            [prefix] => cache.invalidate_prefix(prefix),
            _ => {
                return Err(ShellError::invalid_argument(
                    "usage: clear_cache [key-prefix]",
                    ctx.input,
                ))
            }
        };
        info!(removed, "Cache cleared");
        Ok(CommandOutcome::output(CommandOutput::message(format!(
            "Cleared {} cache entries",
            removed
        ))))
    }
}

pub struct CreateRoutingCache;

#[async_trait]
impl CommandHandler for CreateRoutingCache {
    async fn run(&self, ctx: &mut HandlerCtx<'_>) -> Result<CommandOutcome, ShellError> {
        ctx.no_args()?;
        let inventory = ctx.inventory.with_bypass(false);
        let tables = inventory
            .route_tables(None)
            .await
            .map_err(|e| ctx.inventory_error(e))?;
        let views = RoutingIndex::new(&inventory).build(&tables);
        let routes: usize = views.iter().map(|v| v.routes.len()).sum();
        info!(tables = views.len(), routes, "Routing index built");
        Ok(CommandOutcome::output(CommandOutput::message(format!(
            "Indexed {} route tables ({} routes)",
            views.len(),
            routes
        ))))
    }
}
