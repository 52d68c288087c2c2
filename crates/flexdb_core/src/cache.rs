//! Read cache for committed records.
//!
//! Entries carry a fixed time-to-live. Expiry is checked lazily on every
//! lookup, and a bulk sweep runs on access once the sweep interval has
//! elapsed since the last one.
//!
//! The cache only ever holds committed values: the store populates it on a
//! committed read or while applying a commit, never from a transaction
//! overlay.

use crate::entity::EntityRef;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct CacheEntry {
    entity: EntityRef,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    /// Entity type → id → entry.
    entries: HashMap<String, HashMap<String, CacheEntry>>,
    last_sweep: Instant,
}

/// TTL cache keyed by (entity type, id).
#[derive(Debug)]
pub struct ReadCache {
    ttl: Duration,
    sweep_interval: Duration,
    inner: Mutex<CacheInner>,
}

impl ReadCache {
    /// Creates a cache. A zero `ttl` disables caching.
    #[must_use]
    pub fn new(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            ttl,
            sweep_interval,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    /// Returns true if entries are ever retained.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Looks up an unexpired entry. Expired entries count as absent.
    pub fn get(&self, entity_type: &str, id: &str) -> Option<EntityRef> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        self.maybe_sweep(&mut inner, now);

        let bucket = inner.entries.get_mut(entity_type)?;
        let entry = bucket.get(id)?;
        if entry.expires_at > now {
            return Some(EntityRef::clone(&entry.entity));
        }
        Self::remove_entry(&mut inner, entity_type, id);
        None
    }

    /// Inserts or refreshes an entry with the configured TTL.
    pub fn insert(&self, entity_type: &str, id: &str, entity: EntityRef) {
        if !self.is_enabled() {
            return;
        }
        let now = Instant::now();
        let mut inner = self.inner.lock();
        self.maybe_sweep(&mut inner, now);

        inner
            .entries
            .entry(entity_type.to_string())
            .or_default()
            .insert(
                id.to_string(),
                CacheEntry {
                    entity,
                    expires_at: now + self.ttl,
                },
            );
    }

    /// Removes an entry if present.
    pub fn invalidate(&self, entity_type: &str, id: &str) {
        let mut inner = self.inner.lock();
        Self::remove_entry(&mut inner, entity_type, id);
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        Self::sweep(&mut inner, now)
    }

    /// Number of entries currently held, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.values().map(HashMap::len).sum()
    }

    /// Returns true if no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn bucket_count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Drops all entries.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Drops one entry and its type bucket once the bucket is empty.
    fn remove_entry(inner: &mut CacheInner, entity_type: &str, id: &str) {
        if let Some(bucket) = inner.entries.get_mut(entity_type) {
            bucket.remove(id);
            if bucket.is_empty() {
                inner.entries.remove(entity_type);
            }
        }
    }

    fn maybe_sweep(&self, inner: &mut CacheInner, now: Instant) {
        if now.duration_since(inner.last_sweep) >= self.sweep_interval {
            let removed = Self::sweep(inner, now);
            if removed > 0 {
                tracing::debug!(removed, "swept expired cache entries");
            }
        }
    }

    fn sweep(inner: &mut CacheInner, now: Instant) -> usize {
        let mut removed = 0;
        for bucket in inner.entries.values_mut() {
            let before = bucket.len();
            bucket.retain(|_, entry| entry.expires_at > now);
            removed += before - bucket.len();
        }
        inner.entries.retain(|_, bucket| !bucket.is_empty());
        inner.last_sweep = now;
        removed
    }
}
