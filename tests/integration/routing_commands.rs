//! find_prefix, find_null_routes, find_ip and trace through the dispatcher.

use super::support::{dispatcher, record_ids, route_keys, run_all, sample_session, session_with};
use awsnet::inventory::{SnapshotInventory, Topology};
use awsnet::routing::{NextHop, TraceOutcome};
use awsnet::shell::CommandOutput;
use awsnet::types::{Association, ResourceKind, RouteEntry, RouteTable, TargetKind};
use std::sync::Arc;

#[tokio::test]
async fn test_find_prefix_orders_longest_first() {
    let dispatcher = dispatcher();
    let mut session = sample_session();
    run_all(&dispatcher, &mut session, &["set vpc prod"]).await;

    let output = dispatcher
        .execute(&mut session, "find_prefix 10.0.0.5")
        .await
        .unwrap();
    assert_eq!(
        route_keys(&output),
        vec![
            "rtb-a2:10.0.0.0/24",
            "rtb-a:10.0.0.0/16",
            "rtb-a2:10.0.0.0/16",
            "rtb-a:0.0.0.0/0",
        ]
    );
}

#[tokio::test]
async fn test_find_prefix_in_route_table_scope() {
    let dispatcher = dispatcher();
    let mut session = sample_session();
    run_all(&dispatcher, &mut session, &["set vpc prod", "set rtb rtb-a2"]).await;

    let output = dispatcher
        .execute(&mut session, "find_prefix 10.0.0.0/24")
        .await
        .unwrap();
    assert_eq!(
        route_keys(&output),
        vec!["rtb-a2:10.0.0.0/24", "rtb-a2:10.0.0.0/16"]
    );

    let exact = dispatcher
        .execute(&mut session, "find-prefix 10.0.0.0/16 --exact")
        .await
        .unwrap();
    assert_eq!(route_keys(&exact), vec!["rtb-a2:10.0.0.0/16"]);
}

#[tokio::test]
async fn test_find_prefix_without_match_is_not_found() {
    let dispatcher = dispatcher();
    let mut session = sample_session();
    run_all(&dispatcher, &mut session, &["set tgw core"]).await;

    let err = dispatcher
        .execute(&mut session, "find_prefix 192.0.2.0/24")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "NotFound");
}

#[tokio::test]
async fn test_find_prefix_rejects_bad_input() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    let err = dispatcher
        .execute(&mut session, "find_prefix 10.0.0.0/33")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidArgument");

    let err = dispatcher
        .execute(&mut session, "find_prefix 10.0.0.0/8 --exact --overlap")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidArgument");
}

#[tokio::test]
async fn test_find_null_routes_by_scope() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    let all = dispatcher
        .execute(&mut session, "find_null_routes")
        .await
        .unwrap();
    assert_eq!(
        route_keys(&all),
        vec!["tgw-rtb-1:10.99.0.0/16", "rtb-a:192.168.0.0/16"]
    );

    run_all(&dispatcher, &mut session, &["set tgw core"]).await;
    let tgw = dispatcher
        .execute(&mut session, "show blackhole-routes")
        .await
        .unwrap();
    assert_eq!(route_keys(&tgw), vec!["tgw-rtb-1:10.99.0.0/16"]);

    run_all(&dispatcher, &mut session, &["end", "set vpc staging"]).await;
    let none = dispatcher
        .execute(&mut session, "find_null_routes")
        .await
        .unwrap();
    assert!(matches!(none, CommandOutput::Message { .. }));
}

#[tokio::test]
async fn test_find_ip_reports_routes_and_interfaces() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    let output = dispatcher
        .execute(&mut session, "find_ip 10.0.1.10")
        .await
        .unwrap();
    let CommandOutput::Sections { sections } = output else {
        panic!("expected sections");
    };
    assert_eq!(
        route_keys(&sections[0]),
        vec![
            "rtb-a:10.0.0.0/16",
            "rtb-a2:10.0.0.0/16",
            "tgw-rtb-1:10.0.0.0/16",
            "rtb-a:0.0.0.0/0",
            "rtb-b:0.0.0.0/0",
        ]
    );
    assert_eq!(record_ids(&sections[1]), vec!["eni-1"]);

    let err = dispatcher
        .execute(&mut session, "find_ip not-an-ip")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidArgument");
}

#[tokio::test]
async fn test_trace_crosses_the_transit_gateway() {
    let dispatcher = dispatcher();
    let mut session = sample_session();
    run_all(&dispatcher, &mut session, &["set vpc prod"]).await;

    let output = dispatcher
        .execute(&mut session, "trace 172.31.5.9")
        .await
        .unwrap();
    let CommandOutput::Trace { result } = output else {
        panic!("expected a trace");
    };
    assert_eq!(result.entry_table, "rtb-a");
    assert_eq!(result.path(), "rtb-a -> tgw-rtb-1 -> rtb-b");
    assert_eq!(
        result.hops[0].next_hop,
        NextHop::Table {
            route_table_id: "tgw-rtb-1".to_string()
        }
    );
    assert_eq!(
        result.outcome,
        TraceOutcome::Delivered {
            target_kind: TargetKind::Instance,
            target_id: "i-2".to_string()
        }
    );
}

#[tokio::test]
async fn test_trace_at_root_needs_a_start() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    let err = dispatcher
        .execute(&mut session, "trace 172.31.5.9")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidArgument");

    let output = dispatcher
        .execute(&mut session, "trace 10.0.3.3 --from vpc-0b2")
        .await
        .unwrap();
    let CommandOutput::Trace { result } = output else {
        panic!("expected a trace");
    };
    assert_eq!(result.path(), "rtb-b -> tgw-rtb-1 -> rtb-a");
    assert_eq!(
        result.outcome,
        TraceOutcome::Delivered {
            target_kind: TargetKind::Local,
            target_id: "local".to_string()
        }
    );
}

#[tokio::test]
async fn test_trace_failures_are_errors() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    let err = dispatcher
        .execute(&mut session, "trace 10.50.0.1 --from vpc-0b2")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "Unreachable");

    let blackholed = dispatcher
        .execute(&mut session, "trace 10.99.1.1 --from rtb-b")
        .await
        .unwrap();
    let CommandOutput::Trace { result } = blackholed else {
        panic!("expected a trace");
    };
    assert_eq!(
        result.outcome,
        TraceOutcome::Blackholed {
            route_table_id: "tgw-rtb-1".to_string()
        }
    );
}

#[tokio::test]
async fn test_trace_detects_routing_loops() {
    // A sends everything to attachment X; B is associated with X and sends it back to
    // attachment Y, which A is associated with.
    let table_a = RouteTable::new("rtb-a", ResourceKind::Vpc, "vpc-a")
        .with_route(RouteEntry::new(
            "0.0.0.0/0".parse().unwrap(),
            TargetKind::Attachment,
            "attach-x",
        ))
        .with_association(Association::new("attach-y"));
    let table_b = RouteTable::new("rtb-b", ResourceKind::TransitGateway, "tgw-b")
        .with_route(RouteEntry::new(
            "172.31.0.0/16".parse().unwrap(),
            TargetKind::Attachment,
            "attach-y",
        ))
        .with_association(Association::new("attach-x"));
    let topology = Topology {
        resources: vec![],
        route_tables: vec![table_a, table_b],
    };
    let dispatcher = dispatcher();
    let mut session = session_with(Arc::new(SnapshotInventory::new(topology)));

    let err = dispatcher
        .execute(&mut session, "trace 172.31.5.9 --from rtb-a")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "RoutingLoopDetected");
    assert!(err.to_string().contains("rtb-a -> rtb-b -> rtb-a"));
}

#[tokio::test]
async fn test_trace_reports_ambiguous_routes() {
    let table = RouteTable::new("rtb-1", ResourceKind::Vpc, "vpc-1")
        .with_route(RouteEntry::new(
            "10.0.0.0/8".parse().unwrap(),
            TargetKind::NatGateway,
            "nat-1",
        ))
        .with_route(RouteEntry::new(
            "10.0.0.0/8".parse().unwrap(),
            TargetKind::InternetGateway,
            "igw-1",
        ));
    let topology = Topology {
        resources: vec![],
        route_tables: vec![table],
    };
    let dispatcher = dispatcher();
    let mut session = session_with(Arc::new(SnapshotInventory::new(topology)));

    let err = dispatcher
        .execute(&mut session, "trace 10.1.1.1 --from vpc-1")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "AmbiguousRoute");
    assert!(err.to_string().contains("nat-1"));
    assert!(err.to_string().contains("igw-1"));
}

#[tokio::test]
async fn test_show_routes_in_route_table() {
    let dispatcher = dispatcher();
    let mut session = sample_session();
    run_all(&dispatcher, &mut session, &["set vpc prod", "set rtb rtb-a"]).await;

    let output = dispatcher.execute(&mut session, "show routes").await.unwrap();
    assert_eq!(
        route_keys(&output),
        vec![
            "rtb-a:10.0.0.0/16",
            "rtb-a:192.168.0.0/16",
            "rtb-a:0.0.0.0/0",
        ]
    );
}
