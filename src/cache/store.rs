//! In-memory TTL store with single-flight population and optional sled write-through.

use crate::cache::key::CacheKey;
use crate::cache::persistence::{PersistedEntry, SledCachePersistence};
use crate::cache::ttl::DEFAULT_TTL;
use crate::error::{InventoryError, StorageError};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Time source. Tests swap in a `ManualClock` to expire entries without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub value: Value,
    pub fetched_at: DateTime<Utc>,
    #[serde(with = "duration_secs")]
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.fetched_at + chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or_default()
    }

    fn to_persisted(&self) -> Result<PersistedEntry, StorageError> {
        Ok(PersistedEntry {
            key: self.key.as_str().to_string(),
            value_json: serde_json::to_string(&self.value)
                .map_err(|e| StorageError::Encoding(e.to_string()))?,
            fetched_at_ms: self.fetched_at.timestamp_millis(),
            ttl_ms: self.ttl.as_millis() as u64,
        })
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
}

/// Bounded retry for transient provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Multiplied by the attempt number before each retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Producer invocations, retries included.
    pub fetches: u64,
    /// Callers that joined an existing in-flight fetch.
    pub coalesced: u64,
    pub retries: u64,
}

type Waiter = oneshot::Sender<Result<Value, InventoryError>>;

#[derive(Default)]
struct InFlight {
    generation: u64,
    waiters: Vec<Waiter>,
}

#[derive(Default)]
struct State {
    entries: HashMap<CacheKey, CacheEntry>,
    in_flight: HashMap<CacheKey, InFlight>,
    /// Bumped by clear and invalidation. A fetch that started under an older
    /// generation returns its value but never stores it.
    generation: u64,
}

enum Claim {
    Hit(Value),
    Wait(oneshot::Receiver<Result<Value, InventoryError>>),
    Lead(u64),
}

pub struct CacheStore {
    state: Mutex<State>,
    persistence: Option<SledCachePersistence>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    default_ttl: Mutex<Duration>,
    stats: Mutex<CacheStats>,
}

impl CacheStore {
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(State::default()),
            persistence: None,
            clock: Arc::new(SystemClock),
            retry: RetryPolicy::default(),
            default_ttl: Mutex::new(DEFAULT_TTL),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Open a store backed by sled, loading every unexpired persisted entry.
    pub fn with_persistence(persistence: SledCachePersistence) -> Result<Self, StorageError> {
        let mut store = Self::in_memory();
        store.load_from(&persistence)?;
        store.persistence = Some(persistence);
        Ok(store)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_default_ttl(self, ttl: Duration) -> Self {
        *self.default_ttl.lock() = ttl;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        *self.default_ttl.lock()
    }

    pub fn set_default_ttl(&self, ttl: Duration) {
        *self.default_ttl.lock() = ttl;
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn is_persistent(&self) -> bool {
        self.persistence.is_some()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn load_from(&mut self, persistence: &SledCachePersistence) -> Result<(), StorageError> {
        let now = self.clock.now();
        let loaded = persistence.load_all(now)?;
        let mut state = self.state.lock();
        for entry in loaded {
            state.entries.insert(entry.key.clone(), entry);
        }
        debug!(entries = state.entries.len(), "Loaded persisted cache entries");
        Ok(())
    }

    /// Unexpired value for `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let now = self.clock.now();
        let state = self.state.lock();
        state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    /// Unexpired entry for `key`, with its fetch time.
    pub fn entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        let now = self.clock.now();
        let state = self.state.lock();
        state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .cloned()
    }

    /// Store `value`, replacing any existing entry for the key.
    pub fn put(&self, key: CacheKey, value: Value, ttl: Option<Duration>) {
        let entry = CacheEntry {
            key: key.clone(),
            value,
            fetched_at: self.clock.now(),
            ttl: ttl.unwrap_or_else(|| self.default_ttl()),
        };
        self.write_through(&entry);
        self.state.lock().entries.insert(key, entry);
    }

    /// Return the cached value or run `producer` to fill it.
    ///
    /// Concurrent callers for the same key while a fetch is running wait for that fetch
    /// instead of starting their own. Errors are shared with the waiters and nothing is
    /// stored.
    pub async fn get_or_populate<F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Option<Duration>,
        producer: F,
    ) -> Result<Value, InventoryError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Value, InventoryError>>,
    {
        let generation = match self.claim(key) {
            Claim::Hit(value) => return Ok(value),
            Claim::Wait(rx) => {
                return rx.await.unwrap_or_else(|_| {
                    Err(InventoryError::Transient(format!(
                        "fetch for {} was abandoned",
                        key
                    )))
                })
            }
            Claim::Lead(generation) => generation,
        };

        let mut guard = FlightGuard {
            store: self,
            key,
            generation,
            armed: true,
        };
        let result = self.fetch_with_retry(key, &producer).await;
        guard.armed = false;
        self.complete(key, generation, ttl, result.clone());
        result
    }

    /// Call `producer` with retries, leaving stored entries untouched.
    pub async fn fetch_bypassing<F, Fut>(
        &self,
        key: &CacheKey,
        producer: F,
    ) -> Result<Value, InventoryError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Value, InventoryError>>,
    {
        self.fetch_with_retry(key, &producer).await
    }

    fn claim(&self, key: &CacheKey) -> Claim {
        let now = self.clock.now();
        let mut state = self.state.lock();

        if let Some(entry) = state.entries.get(key) {
            if !entry.is_expired(now) {
                self.stats.lock().hits += 1;
                return Claim::Hit(entry.value.clone());
            }
        }

        let generation = state.generation;
        if let Some(flight) = state.in_flight.get_mut(key) {
            if flight.generation == generation {
                let (tx, rx) = oneshot::channel();
                flight.waiters.push(tx);
                self.stats.lock().coalesced += 1;
                debug!(key = %key, waiters = flight.waiters.len(), "Joined in-flight fetch");
                return Claim::Wait(rx);
            }
        }

        // A flight from an older generation is superseded; its waiters move to ours.
        self.stats.lock().misses += 1;
        let waiters = state
            .in_flight
            .remove(key)
            .map(|flight| flight.waiters)
            .unwrap_or_default();
        state
            .in_flight
            .insert(key.clone(), InFlight { generation, waiters });
        Claim::Lead(generation)
    }

    async fn fetch_with_retry<F, Fut>(
        &self,
        key: &CacheKey,
        producer: &F,
    ) -> Result<Value, InventoryError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Value, InventoryError>>,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            self.stats.lock().fetches += 1;
            match producer().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = self.retry.backoff * attempt;
                    warn!(
                        key = %key,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient inventory failure, retrying"
                    );
                    self.stats.lock().retries += 1;
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn complete(
        &self,
        key: &CacheKey,
        generation: u64,
        ttl: Option<Duration>,
        result: Result<Value, InventoryError>,
    ) {
        let ttl = ttl.unwrap_or_else(|| self.default_ttl());
        let mut stored = None;
        let waiters = {
            let mut state = self.state.lock();
            let flight = take_flight(&mut state, key, generation);
            if let Ok(value) = &result {
                if state.generation == generation && flight.generation == generation {
                    let entry = CacheEntry {
                        key: key.clone(),
                        value: value.clone(),
                        fetched_at: self.clock.now(),
                        ttl,
                    };
                    state.entries.insert(key.clone(), entry.clone());
                    stored = Some(entry);
                }
            }
            flight.waiters
        };

        if let Some(entry) = stored {
            self.write_through(&entry);
        }
        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }
    }

    fn abandon(&self, key: &CacheKey, generation: u64) {
        let waiters = take_flight(&mut self.state.lock(), key, generation).waiters;
        for waiter in waiters {
            let _ = waiter.send(Err(InventoryError::Transient(format!(
                "fetch for {} was abandoned",
                key
            ))));
        }
    }

    fn write_through(&self, entry: &CacheEntry) {
        if let Some(persistence) = &self.persistence {
            let result = entry
                .to_persisted()
                .and_then(|persisted| persistence.put(&persisted));
            if let Err(e) = result {
                warn!(key = %entry.key, error = %e, "Failed to persist cache entry");
            }
        }
    }

    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let removed = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.entries.remove(key).is_some()
        };
        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.remove(key.as_str()) {
                warn!(key = %key, error = %e, "Failed to remove persisted cache entry");
            }
        }
        removed
    }

    /// Drop every entry whose key starts with `prefix`; returns how many went.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let removed = {
            let mut state = self.state.lock();
            state.generation += 1;
            let before = state.entries.len();
            state.entries.retain(|key, _| !key.starts_with(prefix));
            before - state.entries.len()
        };
        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.remove_prefix(prefix) {
                warn!(prefix, error = %e, "Failed to remove persisted cache entries");
            }
        }
        removed
    }

    pub fn clear_all(&self) -> Result<usize, StorageError> {
        let removed = {
            let mut state = self.state.lock();
            let count = state.entries.len();
            state.entries.clear();
            state.generation += 1;
            count
        };
        if let Some(persistence) = &self.persistence {
            persistence.clear()?;
        }
        Ok(removed)
    }

    /// Snapshot of all entries, expired ones included, sorted by key.
    pub fn entries(&self) -> Vec<CacheEntry> {
        let state = self.state.lock();
        let mut entries: Vec<CacheEntry> = state.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.lock()
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        match &self.persistence {
            Some(persistence) => persistence.flush(),
            None => Ok(()),
        }
    }
}

/// Removes the in-flight slot for `key` only if it still belongs to `generation`.
/// A superseded leader gets an empty flight back.
fn take_flight(state: &mut State, key: &CacheKey, generation: u64) -> InFlight {
    let current = state
        .in_flight
        .get(key)
        .map_or(false, |flight| flight.generation == generation);
    if current {
        state.in_flight.remove(key).unwrap_or_default()
    } else {
        InFlight::default()
    }
}

/// Releases the in-flight slot if the leading future is dropped before completing.
struct FlightGuard<'a> {
    store: &'a CacheStore,
    key: &'a CacheKey,
    generation: u64,
    armed: bool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.store.abandon(self.key, self.generation);
        }
    }
}
