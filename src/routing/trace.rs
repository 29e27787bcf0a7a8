//! Multi-hop route tracing.
//!
//! Starting at an entry table, pick the longest matching route. When it points at an
//! attachment (or gateway) that another owner's route table is associated with, continue
//! in that table. Stop on a terminal target, no match, a revisited table, a tie between
//! different targets, or a blackhole.

use crate::routing::prefix::covers;
use crate::types::{RouteEntry, RouteTable, TargetKind};
use ipnetwork::IpNetwork;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::trace as trace_log;

/// Route tables indexed for tracing.
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    tables: BTreeMap<String, RouteTable>,
    /// Attachment or resource id → ids of tables associated with it.
    by_association: HashMap<String, Vec<String>>,
    /// Owner id → ids of tables it owns.
    by_owner: HashMap<String, Vec<String>>,
}

impl TableSet {
    pub fn new(tables: Vec<RouteTable>) -> Self {
        let mut set = TableSet::default();
        for table in tables {
            set.insert(table);
        }
        for ids in set.by_association.values_mut().chain(set.by_owner.values_mut()) {
            ids.sort();
            ids.dedup();
        }
        set
    }

    fn insert(&mut self, table: RouteTable) {
        for association in &table.associations {
            self.by_association
                .entry(association.attachment_id.clone())
                .or_default()
                .push(table.id.clone());
            if let Some(resource) = &association.resource_id {
                self.by_association
                    .entry(resource.clone())
                    .or_default()
                    .push(table.id.clone());
            }
        }
        self.by_owner
            .entry(table.owner_id.clone())
            .or_default()
            .push(table.id.clone());
        self.tables.insert(table.id.clone(), table);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&RouteTable> {
        self.tables.get(id)
    }

    /// Table that receives traffic sent from `from` to `target_id`.
    ///
    /// Tables owned by the same resource as `from` are skipped: a transit gateway route
    /// to an attachment leaves the gateway rather than re-entering it. Several candidates
    /// resolve to the smallest id.
    pub fn table_for_target(&self, from: &RouteTable, target_id: &str) -> Option<&RouteTable> {
        self.by_association
            .get(target_id)?
            .iter()
            .filter_map(|id| self.tables.get(id))
            .find(|table| table.owner_id != from.owner_id)
    }

    /// Entry table for a trace started from `resource_id`.
    ///
    /// Tried in order: a route table id, the main table of an owner (or its first table),
    /// then a table associated with the resource.
    pub fn entry_table_for(&self, resource_id: &str) -> Option<&RouteTable> {
        if let Some(table) = self.tables.get(resource_id) {
            return Some(table);
        }
        if let Some(owned) = self.by_owner.get(resource_id) {
            let owned: Vec<&RouteTable> = owned.iter().filter_map(|id| self.tables.get(id)).collect();
            if let Some(main) = owned.iter().find(|t| t.main) {
                return Some(*main);
            }
            if let Some(first) = owned.first() {
                return Some(*first);
            }
        }
        self.by_association
            .get(resource_id)
            .and_then(|ids| ids.first())
            .and_then(|id| self.tables.get(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NextHop {
    Table { route_table_id: String },
    Target { target_kind: TargetKind, target_id: String },
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceHop {
    pub route_table_id: String,
    pub matched_route: RouteEntry,
    pub next_hop: NextHop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum TraceOutcome {
    Delivered {
        target_kind: TargetKind,
        target_id: String,
    },
    Blackholed {
        route_table_id: String,
    },
    Unreachable {
        route_table_id: String,
    },
    RoutingLoopDetected {
        route_table_id: String,
    },
    AmbiguousRoute {
        route_table_id: String,
        candidates: Vec<RouteEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceResult {
    pub destination: IpNetwork,
    pub entry_table: String,
    pub hops: Vec<TraceHop>,
    pub outcome: TraceOutcome,
}

impl TraceResult {
    /// `rtb-a -> tgw-rtb-1 -> rtb-c`
    pub fn path(&self) -> String {
        let mut tables: Vec<&str> = self.hops.iter().map(|h| h.route_table_id.as_str()).collect();
        if let TraceOutcome::RoutingLoopDetected { route_table_id } = &self.outcome {
            tables.push(route_table_id);
        }
        if tables.is_empty() {
            return self.entry_table.clone();
        }
        tables.join(" -> ")
    }
}

/// Winning routes of `table` for `destination`: all covering routes of the longest
/// matching length.
fn longest_matches<'t>(table: &'t RouteTable, destination: &IpNetwork) -> Vec<&'t RouteEntry> {
    let covering: Vec<&RouteEntry> = table
        .routes
        .iter()
        .filter(|r| covers(&r.destination, destination))
        .collect();
    let Some(longest) = covering.iter().map(|r| r.destination.prefix()).max() else {
        return Vec::new();
    };
    covering
        .into_iter()
        .filter(|r| r.destination.prefix() == longest)
        .collect()
}

pub fn trace(tables: &TableSet, entry: &RouteTable, destination: IpNetwork) -> TraceResult {
    let mut hops = Vec::new();
    let mut visited: Vec<String> = Vec::new();
    let mut current = entry;

    let outcome = loop {
        if visited.iter().any(|id| *id == current.id) {
            break TraceOutcome::RoutingLoopDetected {
                route_table_id: current.id.clone(),
            };
        }
        visited.push(current.id.clone());

        let winners = longest_matches(current, &destination);
        let Some(winner) = winners.first().copied() else {
            break TraceOutcome::Unreachable {
                route_table_id: current.id.clone(),
            };
        };

        let distinct_target = winners
            .iter()
            .any(|r| r.target_kind != winner.target_kind || r.target_id != winner.target_id);
        if distinct_target {
            break TraceOutcome::AmbiguousRoute {
                route_table_id: current.id.clone(),
                candidates: winners.into_iter().cloned().collect(),
            };
        }

        trace_log!(table = %current.id, route = %winner.destination, target = %winner.target_id, "Trace hop");

        if winner.is_blackhole() {
            hops.push(TraceHop {
                route_table_id: current.id.clone(),
                matched_route: winner.clone(),
                next_hop: NextHop::Dropped,
            });
            break TraceOutcome::Blackholed {
                route_table_id: current.id.clone(),
            };
        }

        let next = if winner.target_kind.may_forward() {
            tables.table_for_target(current, &winner.target_id)
        } else {
            None
        };

        match next {
            Some(next) => {
                hops.push(TraceHop {
                    route_table_id: current.id.clone(),
                    matched_route: winner.clone(),
                    next_hop: NextHop::Table {
                        route_table_id: next.id.clone(),
                    },
                });
                current = next;
            }
            None => {
                hops.push(TraceHop {
                    route_table_id: current.id.clone(),
                    matched_route: winner.clone(),
                    next_hop: NextHop::Target {
                        target_kind: winner.target_kind.clone(),
                        target_id: winner.target_id.clone(),
                    },
                });
                break TraceOutcome::Delivered {
                    target_kind: winner.target_kind.clone(),
                    target_id: winner.target_id.clone(),
                };
            }
        }
    };

    TraceResult {
        destination,
        entry_table: entry.id.clone(),
        hops,
        outcome,
    }
}
