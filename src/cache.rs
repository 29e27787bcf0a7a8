//! TTL cache for inventory results.
//!
//! Entries are keyed by resource kind, session scope and id. Concurrent misses for the
//! same key share one upstream fetch; transient provider failures are retried before the
//! error reaches any caller.

pub mod key;
pub mod persistence;
pub mod store;
pub mod ttl;

pub use key::{CacheKey, CacheScope};
pub use persistence::{PersistedEntry, SledCachePersistence};
pub use store::{CacheEntry, CacheStats, CacheStore, Clock, ManualClock, RetryPolicy, SystemClock};
pub use ttl::{format_ttl, parse_ttl, DEFAULT_TTL};
