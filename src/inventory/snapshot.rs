//! Inventory backed by a topology snapshot file.

use crate::error::InventoryError;
use crate::inventory::{InventoryProvider, InventoryScope};
use crate::types::{ResourceKind, ResourceRecord, RouteTable};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Serialized topology: flat resources plus full route tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
    #[serde(default)]
    pub route_tables: Vec<RouteTable>,
}

impl Topology {
    pub fn from_json(json: &str) -> Result<Self, InventoryError> {
        serde_json::from_str(json)
            .map_err(|e| InventoryError::Permanent(format!("invalid topology snapshot: {}", e)))
    }
}

pub struct SnapshotInventory {
    name: String,
    topology: Topology,
}

impl SnapshotInventory {
    pub fn new(topology: Topology) -> Self {
        Self {
            name: "snapshot".to_string(),
            topology,
        }
    }

    pub fn empty() -> Self {
        Self::new(Topology::default())
    }

    pub fn from_path(path: &Path) -> Result<Self, InventoryError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            InventoryError::Permanent(format!("failed to read snapshot {}: {}", path.display(), e))
        })?;
        let topology = Topology::from_json(&json)?;
        info!(
            path = %path.display(),
            resources = topology.resources.len(),
            route_tables = topology.route_tables.len(),
            "Loaded topology snapshot"
        );
        Ok(Self {
            name: format!("snapshot:{}", path.display()),
            topology,
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }
}

#[async_trait]
impl InventoryProvider for SnapshotInventory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list(
        &self,
        kind: ResourceKind,
        scope: &InventoryScope,
    ) -> Result<Vec<ResourceRecord>, InventoryError> {
        if kind == ResourceKind::RouteTable {
            return Ok(self
                .topology
                .route_tables
                .iter()
                .filter(|t| scope.includes_region(t.region.as_deref()))
                .filter(|t| match &scope.parent_id {
                    Some(parent) => &t.owner_id == parent,
                    None => true,
                })
                .map(RouteTable::to_record)
                .collect());
        }

        Ok(self
            .topology
            .resources
            .iter()
            .filter(|r| r.kind == kind)
            .filter(|r| scope.includes_region(r.region.as_deref()))
            .filter(|r| match &scope.parent_id {
                Some(parent) => r.parent_id.as_deref() == Some(parent.as_str()),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn route_table(
        &self,
        id: &str,
        scope: &InventoryScope,
    ) -> Result<RouteTable, InventoryError> {
        self.topology
            .route_tables
            .iter()
            .find(|t| t.id == id && scope.includes_region(t.region.as_deref()))
            .cloned()
            .ok_or_else(|| InventoryError::NotFound {
                kind: "route-table".to_string(),
                id: id.to_string(),
            })
    }
}
