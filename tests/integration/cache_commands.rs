//! Cache behaviour seen through shell commands: hits, bypass, expiry, retries and
//! persistence.

use super::support::{
    dispatcher, fast_cache, record_ids, run_all, sample_topology, CountingInventory,
    FlakyInventory,
};
use awsnet::cache::{CacheStore, ManualClock, RetryPolicy, SledCachePersistence};
use awsnet::error::InventoryError;
use awsnet::inventory::SnapshotInventory;
use awsnet::shell::{CommandOutput, Session, SessionOptions};
use awsnet::types::ResourceKind;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn counting_session() -> (Arc<CountingInventory>, Session) {
    let provider = Arc::new(CountingInventory::new(sample_topology()));
    let session = Session::new(provider.clone(), fast_cache(), SessionOptions::default());
    (provider, session)
}

#[tokio::test]
async fn test_repeated_listing_is_served_from_cache() {
    let dispatcher = dispatcher();
    let (provider, mut session) = counting_session();

    run_all(&dispatcher, &mut session, &["show vpcs", "show vpcs"]).await;
    assert_eq!(provider.lists.load(Ordering::SeqCst), 1);
    assert_eq!(session.cache().stats().hits, 1);
}

#[tokio::test]
async fn test_no_cache_reads_go_to_the_provider() {
    let dispatcher = dispatcher();
    let (provider, mut session) = counting_session();

    run_all(
        &dispatcher,
        &mut session,
        &["set no-cache on", "show vpcs", "show vpcs"],
    )
    .await;
    assert_eq!(provider.lists.load(Ordering::SeqCst), 2);
    assert!(session.cache().is_empty());

    run_all(&dispatcher, &mut session, &["set no-cache off", "show vpcs", "show vpcs"]).await;
    assert_eq!(provider.lists.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_expired_entries_are_fetched_again() {
    let dispatcher = dispatcher();
    let clock = Arc::new(ManualClock::default());
    let provider = Arc::new(CountingInventory::new(sample_topology()));
    let cache = Arc::new(CacheStore::in_memory().with_clock(clock.clone()));
    let mut session = Session::new(provider.clone(), cache, SessionOptions::default());

    run_all(&dispatcher, &mut session, &["show vpcs"]).await;
    clock.advance(Duration::from_secs(14 * 60));
    run_all(&dispatcher, &mut session, &["show vpcs"]).await;
    assert_eq!(provider.lists.load(Ordering::SeqCst), 1);

    clock.advance(Duration::from_secs(2 * 60));
    run_all(&dispatcher, &mut session, &["show vpcs"]).await;
    assert_eq!(provider.lists.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cache_ttl_applies_to_new_entries() {
    let dispatcher = dispatcher();
    let clock = Arc::new(ManualClock::default());
    let provider = Arc::new(CountingInventory::new(sample_topology()));
    let cache = Arc::new(CacheStore::in_memory().with_clock(clock.clone()));
    let mut session = Session::new(provider.clone(), cache, SessionOptions::default());

    let output = dispatcher
        .execute(&mut session, "set cache-ttl 1h")
        .await
        .unwrap();
    assert_eq!(output, CommandOutput::message("Cache TTL set to 1h"));

    run_all(&dispatcher, &mut session, &["show vpcs"]).await;
    clock.advance(Duration::from_secs(30 * 60));
    run_all(&dispatcher, &mut session, &["show vpcs"]).await;
    assert_eq!(provider.lists.load(Ordering::SeqCst), 1);

    let err = dispatcher
        .execute(&mut session, "set cache-ttl 0m")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidArgument");
}

#[tokio::test]
async fn test_concurrent_reads_share_one_fetch() {
    let (provider, session) = counting_session();
    let inventory = session.inventory();

    let (a, b) = tokio::join!(
        inventory.list(ResourceKind::Vpc, None),
        inventory.list(ResourceKind::Vpc, None)
    );
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(provider.lists.load(Ordering::SeqCst), 1);
    assert_eq!(session.cache().stats().coalesced, 1);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let dispatcher = dispatcher();
    let provider = Arc::new(FlakyInventory::new(
        sample_topology(),
        2,
        InventoryError::Transient("throttled".to_string()),
    ));
    let mut session = Session::new(provider.clone(), fast_cache(), SessionOptions::default());

    let output = dispatcher.execute(&mut session, "show vpcs").await.unwrap();
    assert_eq!(record_ids(&output).len(), 3);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    assert_eq!(session.cache().stats().retries, 2);
}

#[tokio::test]
async fn test_exhausted_retries_surface_as_adapter_error() {
    let dispatcher = dispatcher();
    let provider = Arc::new(FlakyInventory::new(
        sample_topology(),
        5,
        InventoryError::Transient("throttled".to_string()),
    ));
    let mut session = Session::new(provider.clone(), fast_cache(), SessionOptions::default());

    let err = dispatcher.execute(&mut session, "show vpcs").await.unwrap_err();
    assert_eq!(err.kind(), "AdapterError");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    assert!(session.cache().is_empty());
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let dispatcher = dispatcher();
    let provider = Arc::new(FlakyInventory::new(
        sample_topology(),
        1,
        InventoryError::Permanent("access denied".to_string()),
    ));
    let mut session = Session::new(provider.clone(), fast_cache(), SessionOptions::default());

    let err = dispatcher.execute(&mut session, "show vpcs").await.unwrap_err();
    assert_eq!(err.kind(), "AdapterError");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    // The failure was not cached.
    let output = dispatcher.execute(&mut session, "show vpcs").await.unwrap();
    assert_eq!(record_ids(&output).len(), 3);
}

#[tokio::test]
async fn test_populate_cache_warms_every_listing() {
    let dispatcher = dispatcher();
    let (provider, mut session) = counting_session();

    let output = dispatcher
        .execute(&mut session, "populate_cache")
        .await
        .unwrap();
    match output {
        CommandOutput::Table { headers, rows, .. } => {
            assert_eq!(headers, vec!["Kind", "Count"]);
            assert!(rows.contains(&vec!["vpc".to_string(), "3".to_string()]));
            assert!(rows.contains(&vec!["route-table".to_string(), "4".to_string()]));
        }
        other => panic!("expected table, got {:?}", other),
    }

    let warmed = provider.calls();
    run_all(
        &dispatcher,
        &mut session,
        &["show vpcs", "set vpc prod", "show subnets", "show security-groups"],
    )
    .await;
    assert_eq!(provider.calls(), warmed);
}

#[tokio::test]
async fn test_populate_cache_ignores_no_cache() {
    let dispatcher = dispatcher();
    let (_provider, mut session) = counting_session();

    run_all(&dispatcher, &mut session, &["set no-cache on", "populate_cache"]).await;
    assert!(!session.cache().is_empty());
}

#[tokio::test]
async fn test_clear_cache_by_prefix_and_entirely() {
    let dispatcher = dispatcher();
    let (_provider, mut session) = counting_session();

    run_all(&dispatcher, &mut session, &["show vpcs", "show transit-gateways"]).await;
    assert_eq!(session.cache().len(), 2);

    let output = dispatcher
        .execute(&mut session, "clear_cache vpc:")
        .await
        .unwrap();
    assert_eq!(output, CommandOutput::message("Cleared 1 cache entries"));
    assert_eq!(session.cache().len(), 1);

    let output = dispatcher.execute(&mut session, "clear_cache").await.unwrap();
    assert_eq!(output, CommandOutput::message("Cleared 1 cache entries"));
    assert!(session.cache().is_empty());
}

#[tokio::test]
async fn test_show_cache_lists_entries_and_statistics() {
    let dispatcher = dispatcher();
    let (_provider, mut session) = counting_session();

    run_all(&dispatcher, &mut session, &["show vpcs", "show vpcs"]).await;
    let output = dispatcher.execute(&mut session, "show cache").await.unwrap();
    let CommandOutput::Sections { sections } = output else {
        panic!("expected sections");
    };
    match &sections[0] {
        CommandOutput::Table { title, rows, .. } => {
            assert_eq!(title, "Cache (1 entries)");
            assert_eq!(rows[0][0], "vpc:default@all:*:list");
            assert_eq!(rows[0][2], "15m");
            assert_eq!(rows[0][3], "no");
        }
        other => panic!("expected table, got {:?}", other),
    }
    match &sections[1] {
        CommandOutput::Detail { fields, .. } => {
            assert!(fields.contains(&("hits".to_string(), "1".to_string())));
            assert!(fields.contains(&("fetches".to_string(), "1".to_string())));
        }
        other => panic!("expected detail, got {:?}", other),
    }
}

#[tokio::test]
async fn test_routing_cache_summary() {
    let dispatcher = dispatcher();
    let (_provider, mut session) = counting_session();

    let output = dispatcher
        .execute(&mut session, "show routing-cache")
        .await
        .unwrap();
    assert!(matches!(output, CommandOutput::Message { .. }));

    let output = dispatcher
        .execute(&mut session, "create_routing_cache")
        .await
        .unwrap();
    assert_eq!(
        output,
        CommandOutput::message("Indexed 4 route tables (10 routes)")
    );

    let output = dispatcher
        .execute(&mut session, "show routing-cache")
        .await
        .unwrap();
    match output {
        CommandOutput::Table { rows, .. } => {
            let tables: Vec<_> = rows.iter().map(|r| r[0].as_str()).collect();
            assert_eq!(tables, vec!["rtb-a", "rtb-a2", "rtb-b", "tgw-rtb-1"]);
            let rtb_a = &rows[0];
            assert_eq!(rtb_a[1], "vpc-0a1");
            assert_eq!(rtb_a[2], "3");
            assert_eq!(rtb_a[3], "1");
        }
        other => panic!("expected table, got {:?}", other),
    }
}

#[tokio::test]
async fn test_persisted_entries_survive_a_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.sled");
    let dispatcher = dispatcher();

    {
        let cache = Arc::new(
            CacheStore::with_persistence(SledCachePersistence::open(&path).unwrap()).unwrap(),
        );
        let mut session = Session::new(
            Arc::new(SnapshotInventory::new(sample_topology())),
            cache.clone(),
            SessionOptions::default(),
        );
        run_all(&dispatcher, &mut session, &["show vpcs"]).await;
        cache.flush().unwrap();
    }

    let provider = Arc::new(CountingInventory::new(sample_topology()));
    let cache = Arc::new(
        CacheStore::with_persistence(SledCachePersistence::open(&path).unwrap())
            .unwrap()
            .with_retry(RetryPolicy::default()),
    );
    assert_eq!(cache.len(), 1);
    let mut session = Session::new(provider.clone(), cache, SessionOptions::default());
    let output = dispatcher.execute(&mut session, "show vpcs").await.unwrap();
    assert_eq!(record_ids(&output), vec!["vpc-0a1", "vpc-0b2", "vpc-0c3"]);
    assert_eq!(provider.calls(), 0);
}
