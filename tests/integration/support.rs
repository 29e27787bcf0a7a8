//! Shared fixtures: a small two-VPC topology joined by a transit gateway, and
//! providers that count or fail calls.

use async_trait::async_trait;
use awsnet::cache::{CacheStore, RetryPolicy};
use awsnet::error::InventoryError;
use awsnet::inventory::{InventoryProvider, InventoryScope, SnapshotInventory, Topology};
use awsnet::shell::{CommandOutput, Dispatcher, Session, SessionOptions};
use awsnet::types::{
    Association, ResourceKind, ResourceRecord, RouteEntry, RouteTable, TargetKind,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn route(cidr: &str, kind: TargetKind, target: &str) -> RouteEntry {
    RouteEntry::new(cidr.parse().unwrap(), kind, target)
}

/// prod (vpc-0a1) and staging (vpc-0b2) attach to tgw-1; shared (vpc-0c3) is alone
/// in eu-west-1.
pub fn sample_topology() -> Topology {
    let resources = vec![
        ResourceRecord::new(ResourceKind::Vpc, "vpc-0a1", "prod")
            .with_region("us-east-1")
            .with_attribute("cidr", json!("10.0.0.0/16")),
        ResourceRecord::new(ResourceKind::Vpc, "vpc-0b2", "staging")
            .with_region("us-east-1")
            .with_attribute("cidr", json!("172.31.0.0/16")),
        ResourceRecord::new(ResourceKind::Vpc, "vpc-0c3", "shared")
            .with_region("eu-west-1")
            .with_attribute("cidr", json!("10.8.0.0/16")),
        ResourceRecord::new(ResourceKind::Subnet, "subnet-1", "prod-a")
            .with_parent("vpc-0a1")
            .with_region("us-east-1")
            .with_attribute("cidr", json!("10.0.1.0/24")),
        ResourceRecord::new(ResourceKind::Subnet, "subnet-2", "prod-b")
            .with_parent("vpc-0a1")
            .with_region("us-east-1")
            .with_attribute("cidr", json!("10.0.2.0/24")),
        ResourceRecord::new(ResourceKind::SecurityGroup, "sg-1", "web")
            .with_parent("vpc-0a1")
            .with_region("us-east-1"),
        ResourceRecord::new(ResourceKind::SecurityGroup, "sg-2", "db")
            .with_parent("vpc-0a1")
            .with_region("us-east-1"),
        ResourceRecord::new(ResourceKind::Ec2Instance, "i-1", "web-1")
            .with_parent("vpc-0a1")
            .with_region("us-east-1")
            .with_attribute("security_groups", json!(["sg-1"])),
        ResourceRecord::new(ResourceKind::NetworkInterface, "eni-1", "")
            .with_parent("i-1")
            .with_region("us-east-1")
            .with_attribute("private_ip", json!("10.0.1.10")),
        ResourceRecord::new(ResourceKind::TransitGateway, "tgw-1", "core")
            .with_region("us-east-1"),
        ResourceRecord::new(ResourceKind::Attachment, "tgw-attach-a", "prod")
            .with_parent("tgw-1")
            .with_region("us-east-1"),
        ResourceRecord::new(ResourceKind::Attachment, "tgw-attach-b", "staging")
            .with_parent("tgw-1")
            .with_region("us-east-1"),
    ];

    let mut rtb_a = RouteTable::new("rtb-a", ResourceKind::Vpc, "vpc-0a1")
        .with_route(route("10.0.0.0/16", TargetKind::Local, "local"))
        .with_route(route("0.0.0.0/0", TargetKind::Attachment, "tgw-attach-a"))
        .with_route(route("192.168.0.0/16", TargetKind::NatGateway, "nat-gone").blackhole())
        .with_association(Association::new("rtbassoc-1").for_resource("subnet-1"))
        .with_association(Association::new("tgw-attach-a").with_type("transit-gateway"));
    rtb_a.main = true;
    rtb_a.region = Some("us-east-1".to_string());

    let rtb_a2 = RouteTable::new("rtb-a2", ResourceKind::Vpc, "vpc-0a1")
        .with_route(route("10.0.0.0/16", TargetKind::Local, "local"))
        .with_route(route("10.0.0.0/24", TargetKind::NetworkInterface, "eni-1"));

    let mut rtb_b = RouteTable::new("rtb-b", ResourceKind::Vpc, "vpc-0b2")
        .with_route(route("172.31.0.0/16", TargetKind::Instance, "i-2"))
        .with_route(route("0.0.0.0/0", TargetKind::Attachment, "tgw-attach-b"))
        .with_association(Association::new("tgw-attach-b").with_type("transit-gateway"));
    rtb_b.main = true;

    let mut tgw_rtb = RouteTable::new("tgw-rtb-1", ResourceKind::TransitGateway, "tgw-1")
        .with_route(route("10.0.0.0/16", TargetKind::Attachment, "tgw-attach-a"))
        .with_route(route("172.31.0.0/16", TargetKind::Attachment, "tgw-attach-b"))
        .with_route(route("10.99.0.0/16", TargetKind::Attachment, "tgw-attach-old").blackhole())
        .with_association(Association::new("tgw-attach-a").for_resource("vpc-0a1"))
        .with_association(Association::new("tgw-attach-b").for_resource("vpc-0b2"));
    tgw_rtb.propagations = vec![Association::new("tgw-attach-a").for_resource("vpc-0a1")];

    Topology {
        resources,
        route_tables: vec![rtb_a, rtb_a2, rtb_b, tgw_rtb],
    }
}

/// Counts provider calls per kind.
pub struct CountingInventory {
    inner: SnapshotInventory,
    pub lists: AtomicUsize,
    pub tables: AtomicUsize,
}

impl CountingInventory {
    pub fn new(topology: Topology) -> Self {
        Self {
            inner: SnapshotInventory::new(topology),
            lists: AtomicUsize::new(0),
            tables: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst) + self.tables.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventoryProvider for CountingInventory {
    fn name(&self) -> &str {
        "counting"
    }

    async fn list(
        &self,
        kind: ResourceKind,
        scope: &InventoryScope,
    ) -> Result<Vec<ResourceRecord>, InventoryError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.inner.list(kind, scope).await
    }

    async fn route_table(
        &self,
        id: &str,
        scope: &InventoryScope,
    ) -> Result<RouteTable, InventoryError> {
        self.tables.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.inner.route_table(id, scope).await
    }
}

/// Fails the first `failures` calls with the given error, then serves the snapshot.
pub struct FlakyInventory {
    inner: SnapshotInventory,
    failures: AtomicUsize,
    error: InventoryError,
    pub calls: AtomicUsize,
}

impl FlakyInventory {
    pub fn new(topology: Topology, failures: usize, error: InventoryError) -> Self {
        Self {
            inner: SnapshotInventory::new(topology),
            failures: AtomicUsize::new(failures),
            error,
            calls: AtomicUsize::new(0),
        }
    }

    fn should_fail(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl InventoryProvider for FlakyInventory {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn list(
        &self,
        kind: ResourceKind,
        scope: &InventoryScope,
    ) -> Result<Vec<ResourceRecord>, InventoryError> {
        if self.should_fail() {
            return Err(self.error.clone());
        }
        self.inner.list(kind, scope).await
    }

    async fn route_table(
        &self,
        id: &str,
        scope: &InventoryScope,
    ) -> Result<RouteTable, InventoryError> {
        if self.should_fail() {
            return Err(self.error.clone());
        }
        self.inner.route_table(id, scope).await
    }
}

/// A snapshot whose resources can be removed mid-session.
pub struct MutableInventory {
    topology: Mutex<Topology>,
}

impl MutableInventory {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology: Mutex::new(topology),
        }
    }

    pub fn remove_resource(&self, id: &str) {
        self.topology.lock().resources.retain(|r| r.id != id);
    }

    fn current(&self) -> SnapshotInventory {
        SnapshotInventory::new(self.topology.lock().clone())
    }
}

#[async_trait]
impl InventoryProvider for MutableInventory {
    fn name(&self) -> &str {
        "mutable"
    }

    async fn list(
        &self,
        kind: ResourceKind,
        scope: &InventoryScope,
    ) -> Result<Vec<ResourceRecord>, InventoryError> {
        let inner = self.current();
        inner.list(kind, scope).await
    }

    async fn route_table(
        &self,
        id: &str,
        scope: &InventoryScope,
    ) -> Result<RouteTable, InventoryError> {
        let inner = self.current();
        inner.route_table(id, scope).await
    }
}

pub fn fast_cache() -> Arc<CacheStore> {
    Arc::new(CacheStore::in_memory().with_retry(RetryPolicy {
        max_attempts: 3,
        backoff: Duration::from_millis(1),
    }))
}

pub fn session_with(provider: Arc<dyn InventoryProvider>) -> Session {
    Session::new(provider, fast_cache(), SessionOptions::default())
}

pub fn sample_session() -> Session {
    session_with(Arc::new(SnapshotInventory::new(sample_topology())))
}

pub fn dispatcher() -> Dispatcher {
    Dispatcher::standard().unwrap()
}

/// Run every line, panicking with the line on the first failure.
pub async fn run_all(dispatcher: &Dispatcher, session: &mut Session, lines: &[&str]) {
    for line in lines {
        if let Err(e) = dispatcher.execute(session, line).await {
            panic!("`{}` failed: {}", line, e);
        }
    }
}

/// Record ids of a `Records` output.
pub fn record_ids(output: &CommandOutput) -> Vec<String> {
    match output {
        CommandOutput::Records { records, .. } => records.iter().map(|r| r.id.clone()).collect(),
        other => panic!("expected records, got {:?}", other),
    }
}

/// `table:destination` for every match of a `Routes` output.
pub fn route_keys(output: &CommandOutput) -> Vec<String> {
    match output {
        CommandOutput::Routes { matches, .. } => matches
            .iter()
            .map(|m| format!("{}:{}", m.route_table_id, m.route.destination))
            .collect(),
        other => panic!("expected routes, got {:?}", other),
    }
}
