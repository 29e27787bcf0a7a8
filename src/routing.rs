//! Route resolution
//!
//! Longest-prefix lookups over route tables, blackhole discovery, multi-hop traces and
//! the sorted routing index kept in the cache.

pub mod index;
pub mod prefix;
pub mod scope;
pub mod trace;

pub use index::{IndexSummary, RouteView, RoutingIndex};
pub use prefix::{
    compare_matches, covers, find_ip, find_null_routes, find_prefix, normalize, parse_prefix,
    PrefixMode, RouteMatch,
};
pub use scope::tables_in_scope;
pub use trace::{trace, NextHop, TableSet, TraceHop, TraceOutcome, TraceResult};
