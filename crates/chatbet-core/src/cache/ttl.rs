//! Keyed TTL cache with single-flight refresh and stale fallback.
//!
//! A lookup returns the cached value while it is fresh. Once an entry's age
//! exceeds its TTL the next lookup refetches it. Concurrent lookups for the
//! same stale or missing key share one upstream fetch: the first caller
//! takes the key's refresh gate, later callers wait on it and then read the
//! refreshed entry. When a refresh fails the previous value is served and
//! reported as [`Freshness::Stale`]; with nothing cached the lookup fails
//! with [`DataError::Unavailable`]. Expired entries stay around as stale
//! fallbacks until [`TtlCache::evict_expired`] drops them.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chatbet_types::error::DataError;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// A memoized value with the time it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub fetched_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// Stale once `now - fetched_at > ttl`.
    pub fn is_stale(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) > self.ttl
    }
}

/// How the returned value relates to its freshness window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    /// Refresh failed; this is the last good value, `age` old.
    Stale { age: Duration },
}

/// Result of a cache lookup.
#[derive(Debug, Clone)]
pub struct Cached<V> {
    pub value: V,
    pub freshness: Freshness,
}

impl<V> Cached<V> {
    pub fn is_stale(&self) -> bool {
        matches!(self.freshness, Freshness::Stale { .. })
    }
}

pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    /// Per-key refresh gates. Held for the duration of an upstream fetch and
    /// removed once no caller is waiting on them.
    gates: DashMap<String, Arc<Mutex<()>>>,
    /// Stale values served after failed refreshes, reported in the warning log.
    stale_serves: AtomicU64,
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            gates: DashMap::new(),
            stale_serves: AtomicU64::new(0),
        }
    }

    /// Return the value for `key`, fetching it with `fetch` if missing or stale.
    pub async fn get<F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<Cached<V>, DataError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, DataError>>,
    {
        if let Some(value) = self.fresh(key) {
            debug!(key, "cache hit");
            return Ok(Cached {
                value,
                freshness: Freshness::Fresh,
            });
        }

        let gate = self.gates.entry(key.to_string()).or_default().clone();
        let result = {
            let _refresh = gate.lock().await;
            self.refresh(key, ttl, fetch).await
        };
        // Only the map and this caller hold the gate: nobody is waiting on it.
        self.gates
            .remove_if(key, |_, g| Arc::ptr_eq(g, &gate) && Arc::strong_count(g) == 2);
        result
    }

    /// Drop entries fetched more than `max_age` ago. Returns how many were removed.
    pub fn evict_expired(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.fetched_at) <= max_age);
        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            debug!(evicted, max_age_secs = max_age.as_secs(), "evicted expired cache entries");
        }
        evicted
    }

    /// Called with the key's refresh gate held.
    async fn refresh<F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<Cached<V>, DataError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, DataError>>,
    {
        // Another caller may have refreshed the entry while we waited.
        if let Some(value) = self.fresh(key) {
            debug!(key, "cache hit after waiting on in-flight refresh");
            return Ok(Cached {
                value,
                freshness: Freshness::Fresh,
            });
        }

        match fetch().await {
            Ok(value) => {
                self.entries.insert(
                    key.to_string(),
                    CacheEntry {
                        key: key.to_string(),
                        value: value.clone(),
                        fetched_at: Instant::now(),
                        ttl,
                    },
                );
                debug!(key, ttl_secs = ttl.as_secs(), "cache refreshed");
                Ok(Cached {
                    value,
                    freshness: Freshness::Fresh,
                })
            }
            Err(err) => {
                let previous = self.entries.get(key).map(|entry| {
                    (
                        entry.value.clone(),
                        Instant::now().saturating_duration_since(entry.fetched_at),
                    )
                });
                match previous {
                    Some((value, age)) => {
                        let stale_serves = self.stale_serves.fetch_add(1, Ordering::Relaxed) + 1;
                        warn!(
                            key,
                            age_secs = age.as_secs(),
                            stale_serves,
                            error = %err,
                            "refresh failed, serving stale entry"
                        );
                        Ok(Cached {
                            value,
                            freshness: Freshness::Stale { age },
                        })
                    }
                    None => Err(DataError::Unavailable {
                        key: key.to_string(),
                        reason: err.to_string(),
                    }),
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn fresh(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.is_stale(Instant::now()) {
            None
        } else {
            Some(entry.value.clone())
        }
    }
}

impl<V: Clone + Send + Sync> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
