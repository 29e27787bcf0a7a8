//! Longest-prefix ordering over generated route tables

use awsnet::routing::prefix::{covers, find_ip, find_prefix, normalize, PrefixMode};
use awsnet::routing::RouteView;
use awsnet::types::{ResourceKind, RouteEntry, RouteTable, TargetKind};
use ipnetwork::{IpNetwork, Ipv4Network};
use proptest::prelude::*;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};

fn network(addr: u32, prefix: u8) -> IpNetwork {
    IpNetwork::V4(Ipv4Network::new(Ipv4Addr::from(addr), prefix).unwrap())
}

/// Up to four tables of up to eight IPv4 routes. Addresses are drawn from 10/8 so
/// that overlaps are common.
fn views() -> impl Strategy<Value = Vec<RouteView>> {
    let route = (0u32..(1 << 24), 8u8..=32).prop_map(|(low, prefix)| {
        RouteEntry::new(
            normalize(network((10 << 24) | low, prefix)),
            TargetKind::TransitGateway,
            "tgw-1",
        )
    });
    prop::collection::vec(prop::collection::vec(route, 0..8), 1..4).prop_map(|tables| {
        tables
            .into_iter()
            .enumerate()
            .map(|(i, routes)| {
                let table = routes.into_iter().fold(
                    RouteTable::new(format!("rtb-{}", i), ResourceKind::Vpc, "vpc-1"),
                    RouteTable::with_route,
                );
                RouteView::from_table(&table)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn test_covering_matches_are_longest_first(views in views(), low in 0u32..(1 << 24)) {
        let ip = Ipv4Addr::from((10 << 24) | low);
        let query = network(u32::from(ip), 32);
        let matches = find_prefix(&views, &query, PrefixMode::Covering);

        for m in &matches {
            prop_assert!(covers(&m.route.destination, &query));
        }
        for pair in matches.windows(2) {
            prop_assert!(pair[0].route.destination.prefix() >= pair[1].route.destination.prefix());
        }

        let expected = views
            .iter()
            .flat_map(|v| v.routes.iter())
            .filter(|r| r.destination.contains(IpAddr::V4(ip)))
            .count();
        prop_assert_eq!(matches.len(), expected);
    }

    #[test]
    fn test_find_ip_reports_each_destination_once_per_table(
        views in views(),
        low in 0u32..(1 << 24),
    ) {
        let ip = IpAddr::V4(Ipv4Addr::from((10 << 24) | low));
        let matches = find_ip(&views, ip);

        let mut seen = HashSet::new();
        for m in &matches {
            prop_assert!(m.route.destination.contains(ip));
            prop_assert!(seen.insert((m.route_table_id.clone(), m.route.destination)));
        }
        if let Some(first) = matches.first() {
            let longest = views
                .iter()
                .flat_map(|v| v.routes.iter())
                .filter(|r| r.destination.contains(ip))
                .map(|r| r.destination.prefix())
                .max();
            prop_assert_eq!(Some(first.route.destination.prefix()), longest);
        }
    }

    #[test]
    fn test_exact_matches_share_the_query_prefix(views in views()) {
        let all: Vec<IpNetwork> = views
            .iter()
            .flat_map(|v| v.routes.iter().map(|r| r.destination))
            .collect();
        prop_assume!(!all.is_empty());
        let query = all[0];

        let matches = find_prefix(&views, &query, PrefixMode::Exact);
        prop_assert!(!matches.is_empty());
        for m in &matches {
            prop_assert_eq!(m.route.destination, query);
        }
    }
}
