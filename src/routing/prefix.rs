//! Prefix parsing and longest-prefix-first matching.

use crate::error::ShellError;
use crate::routing::index::RouteView;
use crate::types::RouteEntry;
use ipnetwork::IpNetwork;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::net::IpAddr;

/// Parse a CIDR or a bare address (taken as /32 or /128), normalized to its network.
pub fn parse_prefix(input: &str) -> Result<IpNetwork, ShellError> {
    let trimmed = input.trim();
    let parsed = if trimmed.contains('/') {
        trimmed.parse::<IpNetwork>().map_err(|e| {
            ShellError::invalid_argument(format!("not a valid CIDR: {}", e), input)
        })?
    } else {
        let addr: IpAddr = trimmed.parse().map_err(|_| {
            ShellError::invalid_argument("not a valid IP address or CIDR", input)
        })?;
        IpNetwork::from(addr)
    };
    Ok(normalize(parsed))
}

/// Zero the host bits: `10.0.1.7/16` becomes `10.0.0.0/16`.
pub fn normalize(net: IpNetwork) -> IpNetwork {
    IpNetwork::new(net.network(), net.prefix()).unwrap_or(net)
}

/// `outer` contains every address of `inner`. Mixed families never cover.
pub fn covers(outer: &IpNetwork, inner: &IpNetwork) -> bool {
    let same_family = outer.is_ipv4() == inner.is_ipv4();
    same_family && outer.prefix() <= inner.prefix() && normalize(*outer).contains(inner.network())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrefixMode {
    /// Destination contains the query.
    #[default]
    Covering,
    Exact,
    /// Either contains the other.
    Overlapping,
}

impl PrefixMode {
    fn accepts(&self, destination: &IpNetwork, query: &IpNetwork) -> bool {
        match self {
            PrefixMode::Covering => covers(destination, query),
            PrefixMode::Exact => normalize(*destination) == *query,
            PrefixMode::Overlapping => covers(destination, query) || covers(query, destination),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    pub route_table_id: String,
    pub route: RouteEntry,
}

fn address_key(net: &IpNetwork) -> (u8, u128) {
    match net.network() {
        IpAddr::V4(v4) => (4, u32::from(v4) as u128),
        IpAddr::V6(v6) => (6, u128::from(v6)),
    }
}

/// Longest prefix first, then lower network address.
pub fn compare_routes(a: &RouteEntry, b: &RouteEntry) -> Ordering {
    b.destination
        .prefix()
        .cmp(&a.destination.prefix())
        .then_with(|| address_key(&a.destination).cmp(&address_key(&b.destination)))
}

/// Route order, ties broken by route table id.
pub fn compare_matches(a: &RouteMatch, b: &RouteMatch) -> Ordering {
    compare_routes(&a.route, &b.route).then_with(|| a.route_table_id.cmp(&b.route_table_id))
}

fn collect<F>(views: &[RouteView], mut keep: F) -> Vec<RouteMatch>
where
    F: FnMut(&RouteEntry) -> bool,
{
    let mut matches: Vec<RouteMatch> = views
        .iter()
        .flat_map(|view| {
            view.routes.iter().map(move |route| (view.route_table_id.as_str(), route))
        })
        .filter(|(_, route)| keep(route))
        .map(|(table, route)| RouteMatch {
            route_table_id: table.to_string(),
            route: route.clone(),
        })
        .collect();
    matches.sort_by(compare_matches);
    matches
}

pub fn find_prefix(views: &[RouteView], query: &IpNetwork, mode: PrefixMode) -> Vec<RouteMatch> {
    let query = normalize(*query);
    collect(views, |route| mode.accepts(&route.destination, &query))
}

pub fn find_null_routes(views: &[RouteView]) -> Vec<RouteMatch> {
    collect(views, RouteEntry::is_blackhole)
}

/// Covering matches for a single address, one per (route table, destination).
pub fn find_ip(views: &[RouteView], ip: IpAddr) -> Vec<RouteMatch> {
    let query = IpNetwork::from(ip);
    let mut seen = HashSet::new();
    find_prefix(views, &query, PrefixMode::Covering)
        .into_iter()
        .filter(|m| seen.insert((m.route_table_id.clone(), normalize(m.route.destination))))
        .collect()
}
