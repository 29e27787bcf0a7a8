//! awsnet: a context-sensitive shell for cloud network topology
//!
//! Users walk a fixed command graph (root, VPCs, transit gateways, core networks, route
//! tables, ...), list resources through a TTL cache in front of an inventory provider,
//! and ask routing questions: longest-prefix lookups, blackhole discovery and multi-hop
//! traces across route tables.

pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod graph;
pub mod inventory;
pub mod logging;
pub mod routing;
pub mod shell;
pub mod types;
