//! Cache keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Session scope a cached value was fetched under.
///
/// Two sessions with different profiles or regions must never share entries, so the
/// scope is part of every key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CacheScope {
    pub profile: Option<String>,
    pub regions: Vec<String>,
}

impl CacheScope {
    pub fn new(profile: Option<String>, regions: &[String]) -> Self {
        let mut regions = regions.to_vec();
        regions.sort();
        regions.dedup();
        Self { profile, regions }
    }
}

impl fmt::Display for CacheScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let profile = self.profile.as_deref().unwrap_or("default");
        if self.regions.is_empty() {
            write!(f, "{}@all", profile)
        } else {
            write!(f, "{}@{}", profile, self.regions.join("+"))
        }
    }
}

/// `kind:scope:id[:sub]`, e.g. `route-table:default@us-east-1:rtb-123:routes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(kind: &str, scope: &CacheScope, id: &str) -> Self {
        CacheKey(format!("{}:{}:{}", kind, scope, id))
    }

    pub fn with_sub(&self, sub: &str) -> Self {
        CacheKey(format!("{}:{}", self.0, sub))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        CacheKey(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading kind segment.
    pub fn kind(&self) -> &str {
        self.0.split(':').next().unwrap_or_default()
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
