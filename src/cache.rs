//! In-memory time-to-live cache used in front of every upstream source.
//!
//! Each cache owns its slots and its TTL policy. Values are stored behind an
//! `Arc` and replaced wholesale, so readers never see a half-written entry.
//!
//! Refresh policy: the slot lock is released while the producer runs. Two
//! callers racing on the same expired key may therefore both call the
//! producer; the last completed write wins. Producers must be idempotent.
//!
//! A failed refresh never poisons the cache: the previous entry stays in
//! place and is served stale. Without a previous entry the producer's error
//! is handed back to the caller. Nothing is retried here; the next call after
//! expiry is the retry.

use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

struct CacheEntry<V> {
    value: Arc<V>,
    stored_at: DateTime<Utc>,
    last_used: u64,
}

impl<V> CacheEntry<V> {
    fn is_valid(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now < self.stored_at + ttl
    }
}

struct Slots<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    tick: u64,
}

impl<K: Eq + Hash + Clone, V> Slots<K, V> {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn evict_for_insert(&mut self, key: &K, capacity: usize, now: DateTime<Utc>, ttl: Duration) -> bool {
        if self.entries.contains_key(key) || self.entries.len() < capacity {
            return false;
        }
        self.entries.retain(|_, e| e.is_valid(now, ttl));
        if self.entries.len() < capacity {
            return true;
        }
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_used)
            .map(|(k, _)| k.clone());
        if let Some(k) = oldest {
            self.entries.remove(&k);
        }
        true
    }
}

/// A keyed TTL cache with a capacity bound and least-recently-used eviction.
pub struct TemporalCache<K, V> {
    name: &'static str,
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
    slots: Mutex<Slots<K, V>>,
}

impl<K, V> TemporalCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    pub fn new(name: &'static str, ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            ttl,
            capacity: capacity.max(1),
            clock,
            slots: Mutex::new(Slots { entries: HashMap::new(), tick: 0 }),
        }
    }

    /// Return the cached value for `key` if it has not expired.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        let now = self.clock.now();
        let mut slots = self.slots.lock();
        let tick = slots.next_tick();
        let entry = slots.entries.get_mut(key)?;
        if !entry.is_valid(now, self.ttl) {
            return None;
        }
        entry.last_used = tick;
        Some(Arc::clone(&entry.value))
    }

    /// Return the cached value, or run `producer` and cache its result.
    ///
    /// On producer failure the expired entry for `key` (if any) is returned
    /// instead, and it keeps its original timestamp.
    pub fn get_or_refresh<E, F>(&self, key: K, producer: F) -> Result<Arc<V>, E>
    where
        E: fmt::Display,
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.peek(&key) {
            tracing::debug!(cache = self.name, ?key, "cache hit");
            return Ok(value);
        }
        tracing::debug!(cache = self.name, ?key, "cache miss, refreshing");

        match producer() {
            Ok(value) => Ok(self.insert(key, value)),
            Err(e) => {
                let slots = self.slots.lock();
                match slots.entries.get(&key) {
                    Some(stale) => {
                        tracing::warn!(
                            cache = self.name,
                            ?key,
                            stored_at = %stale.stored_at,
                            error = %e,
                            "refresh failed, serving stale entry"
                        );
                        Ok(Arc::clone(&stale.value))
                    }
                    None => {
                        tracing::warn!(cache = self.name, ?key, error = %e, "refresh failed, nothing cached");
                        Err(e)
                    }
                }
            }
        }
    }

    /// Store `value` under `key` with the current timestamp.
    pub fn insert(&self, key: K, value: V) -> Arc<V> {
        let now = self.clock.now();
        let value = Arc::new(value);
        let mut slots = self.slots.lock();
        if slots.evict_for_insert(&key, self.capacity, now, self.ttl) {
            tracing::debug!(cache = self.name, capacity = self.capacity, "evicted to make room");
        }
        let tick = slots.next_tick();
        slots.entries.insert(
            key,
            CacheEntry {
                value: Arc::clone(&value),
                stored_at: now,
                last_used: tick,
            },
        );
        value
    }

    pub fn invalidate(&self, key: &K) {
        self.slots.lock().entries.remove(key);
    }

    pub fn clear(&self) {
        self.slots.lock().entries.clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.slots.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> fmt::Debug for TemporalCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporalCache")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
