//! Inventory providers.
//!
//! A provider enumerates resources for a kind within a scope. Providers are expected to
//! be idempotent for reads; the shell never calls them directly but always through
//! `CachedInventory`.

pub mod cached;
pub mod snapshot;

pub use cached::CachedInventory;
pub use snapshot::{SnapshotInventory, Topology};

use crate::error::InventoryError;
use crate::types::{ResourceKind, ResourceRecord, RouteTable};
use async_trait::async_trait;

/// What a provider call is restricted to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryScope {
    pub profile: Option<String>,
    /// Empty means every region.
    pub regions: Vec<String>,
    /// Restrict to children of this resource.
    pub parent_id: Option<String>,
}

impl InventoryScope {
    pub fn new(profile: Option<String>, regions: Vec<String>) -> Self {
        Self {
            profile,
            regions,
            parent_id: None,
        }
    }

    pub fn with_parent(&self, parent_id: Option<&str>) -> Self {
        Self {
            profile: self.profile.clone(),
            regions: self.regions.clone(),
            parent_id: parent_id.map(str::to_string),
        }
    }

    pub fn includes_region(&self, region: Option<&str>) -> bool {
        match region {
            Some(region) if !self.regions.is_empty() => self.regions.iter().any(|r| r == region),
            _ => true,
        }
    }
}

#[async_trait]
pub trait InventoryProvider: Send + Sync {
    /// Provider name for logs and `show config`.
    fn name(&self) -> &str;

    /// Resources of `kind` in `scope`, in provider order. Empty is `Ok(vec![])`, never
    /// `NotFound`.
    async fn list(
        &self,
        kind: ResourceKind,
        scope: &InventoryScope,
    ) -> Result<Vec<ResourceRecord>, InventoryError>;

    /// One route table with its routes and associations.
    async fn route_table(
        &self,
        id: &str,
        scope: &InventoryScope,
    ) -> Result<RouteTable, InventoryError>;
}
