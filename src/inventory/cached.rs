//! Inventory reads routed through the cache store.

use crate::cache::{CacheKey, CacheScope, CacheStore};
use crate::error::InventoryError;
use crate::inventory::{InventoryProvider, InventoryScope};
use crate::types::{ResourceKind, ResourceRecord, RouteTable};
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// A provider bound to a session scope and a cache.
///
/// With `bypass` set every read goes straight to the provider (with retries) and the
/// cache is left as it was.
#[derive(Clone)]
pub struct CachedInventory {
    provider: Arc<dyn InventoryProvider>,
    cache: Arc<CacheStore>,
    scope: InventoryScope,
    cache_scope: CacheScope,
    bypass: bool,
}

impl CachedInventory {
    pub fn new(
        provider: Arc<dyn InventoryProvider>,
        cache: Arc<CacheStore>,
        scope: InventoryScope,
        bypass: bool,
    ) -> Self {
        let cache_scope = CacheScope::new(scope.profile.clone(), &scope.regions);
        Self {
            provider,
            cache,
            scope,
            cache_scope,
            bypass,
        }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn cache_scope(&self) -> &CacheScope {
        &self.cache_scope
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn bypass(&self) -> bool {
        self.bypass
    }

    /// Same provider and scope with bypass switched.
    pub fn with_bypass(&self, bypass: bool) -> Self {
        Self {
            bypass,
            ..self.clone()
        }
    }

    pub fn list_key(&self, kind: ResourceKind, parent: Option<&str>) -> CacheKey {
        CacheKey::new(kind.as_str(), &self.cache_scope, parent.unwrap_or("*")).with_sub("list")
    }

    pub fn route_table_key(&self, id: &str) -> CacheKey {
        CacheKey::new(ResourceKind::RouteTable.as_str(), &self.cache_scope, id).with_sub("routes")
    }

    /// Resources of `kind`, optionally restricted to children of `parent`.
    pub async fn list(
        &self,
        kind: ResourceKind,
        parent: Option<&str>,
    ) -> Result<Vec<ResourceRecord>, InventoryError> {
        let key = self.list_key(kind, parent);
        let scope = self.scope.with_parent(parent);
        let provider = self.provider.clone();
        self.read(&key, move || {
            let provider = provider.clone();
            let scope = scope.clone();
            async move { encode(&provider.list(kind, &scope).await?) }
        })
        .await
    }

    pub async fn route_table(&self, id: &str) -> Result<RouteTable, InventoryError> {
        let key = self.route_table_key(id);
        let scope = self.scope.clone();
        let provider = self.provider.clone();
        let id = id.to_string();
        self.read(&key, move || {
            let provider = provider.clone();
            let scope = scope.clone();
            let id = id.clone();
            async move { encode(&provider.route_table(&id, &scope).await?) }
        })
        .await
    }

    /// Every route table owned by `owner`, or every known table when `owner` is `None`.
    ///
    /// Tables are fetched in parallel; identical keys still share one fetch.
    pub async fn route_tables(&self, owner: Option<&str>) -> Result<Vec<RouteTable>, InventoryError> {
        let summaries = self.list(ResourceKind::RouteTable, owner).await?;
        let tables = join_all(summaries.iter().map(|s| self.route_table(&s.id))).await;
        let mut tables = tables.into_iter().collect::<Result<Vec<_>, _>>()?;
        tables.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(tables)
    }

    async fn read<T, F, Fut>(&self, key: &CacheKey, producer: F) -> Result<T, InventoryError>
    where
        T: DeserializeOwned,
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<Value, InventoryError>>,
    {
        let value = if self.bypass {
            self.cache.fetch_bypassing(key, producer).await?
        } else {
            self.cache.get_or_populate(key, None, producer).await?
        };
        serde_json::from_value(value)
            .map_err(|e| InventoryError::Permanent(format!("corrupt cache entry {}: {}", key, e)))
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Value, InventoryError> {
    serde_json::to_value(value).map_err(|e| InventoryError::Permanent(e.to_string()))
}
