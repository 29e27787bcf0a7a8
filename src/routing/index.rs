//! Sorted routing index stored in the cache.
//!
//! `create_routing_cache` writes one view per route table under
//! `routing-index:<scope>:<rtb>:sorted`; prefix lookups prefer those views to sorting
//! the raw table again, as long as the view is no older than the cached table.

use crate::cache::{CacheKey, CacheScope};
use crate::inventory::CachedInventory;
use crate::routing::prefix::compare_routes;
use crate::types::{ResourceKind, RouteEntry, RouteTable};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const INDEX_KIND: &str = "routing-index";

/// A route table's routes, longest prefix first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteView {
    pub route_table_id: String,
    pub owner_kind: ResourceKind,
    pub owner_id: String,
    pub routes: Vec<RouteEntry>,
}

impl RouteView {
    pub fn from_table(table: &RouteTable) -> Self {
        let mut routes = table.routes.clone();
        routes.sort_by(compare_routes);
        Self {
            route_table_id: table.id.clone(),
            owner_kind: table.owner_kind,
            owner_id: table.owner_id.clone(),
            routes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSummary {
    pub route_table_id: String,
    pub owner_id: String,
    pub routes: usize,
    pub blackholes: usize,
    pub age: Duration,
    pub expired: bool,
}

pub struct RoutingIndex<'a> {
    inventory: &'a CachedInventory,
}

impl<'a> RoutingIndex<'a> {
    pub fn new(inventory: &'a CachedInventory) -> Self {
        Self { inventory }
    }

    pub fn key(scope: &CacheScope, route_table_id: &str) -> CacheKey {
        CacheKey::new(INDEX_KIND, scope, route_table_id).with_sub("sorted")
    }

    fn prefix(scope: &CacheScope) -> String {
        format!("{}:{}:", INDEX_KIND, scope)
    }

    /// Store a sorted view for every table; returns the views written.
    pub fn build(&self, tables: &[RouteTable]) -> Vec<RouteView> {
        let cache = self.inventory.cache();
        let scope = self.inventory.cache_scope();
        let views: Vec<RouteView> = tables.iter().map(RouteView::from_table).collect();
        for view in &views {
            match serde_json::to_value(view) {
                Ok(value) => cache.put(Self::key(scope, &view.route_table_id), value, None),
                Err(e) => debug!(table = %view.route_table_id, error = %e, "Skipped index entry"),
            }
        }
        views
    }

    /// Views for `tables`, taken from the index where present.
    ///
    /// In bypass mode the index is ignored along with the rest of the cache. An index
    /// entry built before the table's cached copy was fetched is ignored too.
    pub fn views(&self, tables: &[RouteTable]) -> Vec<RouteView> {
        tables
            .iter()
            .map(|table| {
                self.indexed(table)
                    .unwrap_or_else(|| RouteView::from_table(table))
            })
            .collect()
    }

    fn indexed(&self, table: &RouteTable) -> Option<RouteView> {
        if self.inventory.bypass() {
            return None;
        }
        let cache = self.inventory.cache();
        let entry = cache.entry(&Self::key(self.inventory.cache_scope(), &table.id))?;
        let fetched = cache.entry(&self.inventory.route_table_key(&table.id))?;
        if entry.fetched_at < fetched.fetched_at {
            debug!(table = %table.id, "Index entry older than the route table, ignoring it");
            return None;
        }
        serde_json::from_value(entry.value).ok()
    }

    /// One row per indexed table in the current scope.
    pub fn summary(&self) -> Vec<IndexSummary> {
        let cache = self.inventory.cache();
        let prefix = Self::prefix(self.inventory.cache_scope());
        let now = cache.now();
        cache
            .entries()
            .into_iter()
            .filter(|entry| entry.key.starts_with(&prefix))
            .filter_map(|entry| {
                let view: RouteView = serde_json::from_value(entry.value.clone()).ok()?;
                Some(IndexSummary {
                    route_table_id: view.route_table_id,
                    owner_id: view.owner_id,
                    blackholes: view.routes.iter().filter(|r| r.is_blackhole()).count(),
                    routes: view.routes.len(),
                    age: entry.age(now),
                    expired: entry.is_expired(now),
                })
            })
            .collect()
    }

    pub fn clear(&self) -> usize {
        self.inventory
            .cache()
            .invalidate_prefix(&Self::prefix(self.inventory.cache_scope()))
    }
}
