//! Context navigation: selection, entering and leaving contexts.

use super::support::{
    dispatcher, record_ids, run_all, sample_session, sample_topology, session_with,
    MutableInventory,
};
use awsnet::context::FrameDetail;
use awsnet::graph::ContextType;
use awsnet::inventory::{SnapshotInventory, Topology};
use awsnet::shell::CommandOutput;
use awsnet::types::{ResourceKind, ResourceRecord};
use std::sync::Arc;

#[tokio::test]
async fn test_index_selection_after_listing() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    let output = dispatcher.execute(&mut session, "show vpcs").await.unwrap();
    assert_eq!(record_ids(&output), vec!["vpc-0a1", "vpc-0b2", "vpc-0c3"]);

    dispatcher.execute(&mut session, "set vpc 1").await.unwrap();
    assert_eq!(session.stack.depth(), 1);
    let top = session.stack.top();
    assert_eq!(top.context, ContextType::Vpc);
    assert_eq!(top.resource_id.as_deref(), Some("vpc-0a1"));
    assert!(matches!(top.cached_detail, FrameDetail::Resource(_)));
    assert_eq!(session.prompt(), "awsnet/vpc:prod>");
}

#[tokio::test]
async fn test_index_without_listing_is_not_found() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    let err = dispatcher.execute(&mut session, "set vpc 1").await.unwrap_err();
    assert_eq!(err.kind(), "NotFound");
    assert_eq!(session.stack.depth(), 0);
}

#[tokio::test]
async fn test_index_against_empty_listing_is_not_found() {
    let dispatcher = dispatcher();
    let mut session = session_with(Arc::new(SnapshotInventory::empty()));

    let output = dispatcher.execute(&mut session, "show vpcs").await.unwrap();
    assert!(record_ids(&output).is_empty());
    let err = dispatcher.execute(&mut session, "set vpc 1").await.unwrap_err();
    assert_eq!(err.kind(), "NotFound");
    assert_eq!(session.stack.depth(), 0);
}

#[tokio::test]
async fn test_index_out_of_range_leaves_stack_unchanged() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    run_all(&dispatcher, &mut session, &["show vpcs"]).await;
    let err = dispatcher.execute(&mut session, "set vpc 4").await.unwrap_err();
    assert_eq!(err.kind(), "NotFound");
    assert_eq!(session.stack.depth(), 0);
}

#[tokio::test]
async fn test_index_of_a_removed_resource_is_not_found() {
    let dispatcher = dispatcher();
    let provider = Arc::new(MutableInventory::new(sample_topology()));
    let mut session = session_with(provider.clone());

    run_all(&dispatcher, &mut session, &["set no-cache on", "show vpcs"]).await;
    provider.remove_resource("vpc-0a1");

    let err = dispatcher.execute(&mut session, "set vpc 1").await.unwrap_err();
    assert_eq!(err.kind(), "NotFound");
    assert_eq!(session.stack.depth(), 0);

    dispatcher.execute(&mut session, "set vpc 2").await.unwrap();
    assert_eq!(session.stack.scope_id(), Some("vpc-0b2"));
}

#[tokio::test]
async fn test_select_by_id_and_label() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    dispatcher.execute(&mut session, "set vpc STAGING").await.unwrap();
    assert_eq!(session.stack.scope_id(), Some("vpc-0b2"));
    dispatcher.execute(&mut session, "end").await.unwrap();

    dispatcher.execute(&mut session, "set vpc vpc-0c3").await.unwrap();
    assert_eq!(session.stack.scope_id(), Some("vpc-0c3"));
}

#[tokio::test]
async fn test_duplicate_labels_are_ambiguous() {
    let topology = Topology {
        resources: vec![
            ResourceRecord::new(ResourceKind::Vpc, "vpc-1", "prod"),
            ResourceRecord::new(ResourceKind::Vpc, "vpc-2", "prod"),
        ],
        route_tables: vec![],
    };
    let dispatcher = dispatcher();
    let mut session = session_with(Arc::new(SnapshotInventory::new(topology)));

    let err = dispatcher.execute(&mut session, "set vpc prod").await.unwrap_err();
    assert_eq!(err.kind(), "AmbiguousSelector");
    assert_eq!(session.stack.depth(), 0);

    dispatcher.execute(&mut session, "set vpc vpc-2").await.unwrap();
    assert_eq!(session.stack.scope_id(), Some("vpc-2"));
}

#[tokio::test]
async fn test_exit_returns_to_the_frame_that_pushed_the_route_table() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    run_all(
        &dispatcher,
        &mut session,
        &["set vpc prod", "show route-tables", "set route-table 2"],
    )
    .await;
    assert_eq!(session.stack.depth(), 2);
    assert_eq!(session.stack.scope_id(), Some("rtb-a2"));
    assert!(matches!(
        session.stack.top().cached_detail,
        FrameDetail::RouteTable(_)
    ));
    assert_eq!(session.prompt(), "awsnet/vpc:prod/rtb:rtb-a2>");

    dispatcher.execute(&mut session, "exit").await.unwrap();
    assert_eq!(session.stack.depth(), 1);
    assert_eq!(session.stack.top().context, ContextType::Vpc);
    assert_eq!(session.stack.scope_id(), Some("vpc-0a1"));
}

#[tokio::test]
async fn test_route_table_under_transit_gateway() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    run_all(
        &dispatcher,
        &mut session,
        &["set tgw core", "set rtb tgw-rtb-1"],
    )
    .await;
    assert_eq!(session.prompt(), "awsnet/tgw:core/rtb:tgw-rtb-1>");

    dispatcher.execute(&mut session, "exit").await.unwrap();
    assert_eq!(session.stack.top().context, ContextType::TransitGateway);
}

#[tokio::test]
async fn test_end_returns_to_root_and_exit_at_root_fails() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    run_all(&dispatcher, &mut session, &["set vpc prod", "set rtb rtb-a", "end"]).await;
    assert_eq!(session.stack.depth(), 0);

    let err = dispatcher.execute(&mut session, "exit").await.unwrap_err();
    assert_eq!(err.kind(), "CannotExitRoot");
    assert_eq!(session.stack.depth(), 0);
}

#[tokio::test]
async fn test_commands_are_scoped_to_their_context() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    let err = dispatcher.execute(&mut session, "show subnets").await.unwrap_err();
    assert_eq!(err.kind(), "InvalidTransition");

    let err = dispatcher.execute(&mut session, "frobnicate").await.unwrap_err();
    assert_eq!(err.kind(), "NotFound");

    run_all(&dispatcher, &mut session, &["set vpc prod"]).await;
    let err = dispatcher.execute(&mut session, "set vpc staging").await.unwrap_err();
    assert_eq!(err.kind(), "InvalidTransition");
    assert_eq!(session.stack.scope_id(), Some("vpc-0a1"));
}

#[tokio::test]
async fn test_child_listings_follow_the_frame() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    run_all(&dispatcher, &mut session, &["set vpc prod"]).await;
    let subnets = dispatcher.execute(&mut session, "show subnets").await.unwrap();
    assert_eq!(record_ids(&subnets), vec!["subnet-1", "subnet-2"]);
    let groups = dispatcher.execute(&mut session, "show security-groups").await.unwrap();
    assert_eq!(record_ids(&groups), vec!["sg-1", "sg-2"]);

    run_all(&dispatcher, &mut session, &["end", "set instance i-1"]).await;
    let groups = dispatcher.execute(&mut session, "show security-groups").await.unwrap();
    assert_eq!(record_ids(&groups), vec!["sg-1"]);
    let enis = dispatcher.execute(&mut session, "show enis").await.unwrap();
    assert_eq!(record_ids(&enis), vec!["eni-1"]);
}

#[tokio::test]
async fn test_show_detail_refreshes_the_frame() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    run_all(&dispatcher, &mut session, &["set vpc prod"]).await;
    let output = dispatcher.execute(&mut session, "show detail").await.unwrap();
    match output {
        CommandOutput::Detail { fields, .. } => {
            assert!(fields.contains(&("cidr".to_string(), "10.0.0.0/16".to_string())));
        }
        other => panic!("expected detail, got {:?}", other),
    }
}

#[tokio::test]
async fn test_regions_filter_listings_and_clear_pins() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    run_all(&dispatcher, &mut session, &["show vpcs"]).await;
    assert!(!session.pins.is_empty());

    dispatcher
        .execute(&mut session, "set regions eu-west-1")
        .await
        .unwrap();
    assert!(session.pins.is_empty());
    let output = dispatcher.execute(&mut session, "show vpcs").await.unwrap();
    assert_eq!(record_ids(&output), vec!["vpc-0c3"]);
}

#[tokio::test]
async fn test_help_lists_the_current_context() {
    let dispatcher = dispatcher();
    let mut session = sample_session();

    let help = dispatcher.execute(&mut session, "help").await.unwrap();
    let rendered = help.render(awsnet::shell::OutputFormat::Table);
    assert!(rendered.contains("show vpcs"));
    assert!(rendered.contains("set vpc <selector>"));

    run_all(&dispatcher, &mut session, &["set vpc prod"]).await;
    let help = dispatcher.execute(&mut session, "?").await.unwrap();
    let rendered = help.render(awsnet::shell::OutputFormat::Table);
    assert!(rendered.contains("show subnets"));
    assert!(!rendered.contains("show vpcs"));
}
