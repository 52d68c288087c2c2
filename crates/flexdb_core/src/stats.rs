//! Database statistics.
//!
//! Counters are atomic and can be read while operations are in progress.
//!
//! ```rust,ignore
//! let db = Database::open_in_memory()?;
//! // ... work ...
//! let stats = db.stats();
//! println!("cache hit ratio: {:.2}", stats.cache_hit_ratio());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Database statistics and metrics.
#[derive(Debug, Default)]
pub struct DatabaseStats {
    /// Point reads that reached the store (overlay misses).
    reads: AtomicU64,
    /// Point reads served from the cache.
    cache_hits: AtomicU64,
    /// Point reads that fell through to the canonical map.
    cache_misses: AtomicU64,
    /// Records staged for upsert.
    writes: AtomicU64,
    /// Records staged for deletion.
    deletes: AtomicU64,
    /// Full type scans performed by `get_all`.
    scans: AtomicU64,
    /// Queries resolved through an index bucket.
    index_lookups: AtomicU64,
    /// Write transactions committed.
    transactions_committed: AtomicU64,
    /// Transactions rolled back (explicitly or on drop).
    transactions_rolled_back: AtomicU64,
    /// Commits refused because persistence failed.
    commit_failures: AtomicU64,
}

impl DatabaseStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_read(&self, cache_hit: bool) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if cache_hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_index_lookup(&self) {
        self.index_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit(&self) {
        self.transactions_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rollback(&self) {
        self.transactions_rolled_back.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit_failure(&self) {
        self.commit_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
            index_lookups: self.index_lookups.load(Ordering::Relaxed),
            transactions_committed: self.transactions_committed.load(Ordering::Relaxed),
            transactions_rolled_back: self.transactions_rolled_back.load(Ordering::Relaxed),
            commit_failures: self.commit_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of database statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Point reads that reached the store.
    pub reads: u64,
    /// Point reads served from the cache.
    pub cache_hits: u64,
    /// Point reads served from the canonical map.
    pub cache_misses: u64,
    /// Records staged for upsert.
    pub writes: u64,
    /// Records staged for deletion.
    pub deletes: u64,
    /// Full type scans.
    pub scans: u64,
    /// Index-resolved queries.
    pub index_lookups: u64,
    /// Write transactions committed.
    pub transactions_committed: u64,
    /// Transactions rolled back.
    pub transactions_rolled_back: u64,
    /// Commits refused because persistence failed.
    pub commit_failures: u64,
}

impl StatsSnapshot {
    /// Fraction of store reads served by the cache, or 0 with no reads.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cache_hit_ratio(&self) -> f64 {
        if self.reads == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.reads as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let snap = DatabaseStats::new().snapshot();
        assert_eq!(snap, StatsSnapshot::default());
        assert_eq!(snap.cache_hit_ratio(), 0.0);
    }

    #[test]
    fn reads_split_into_hits_and_misses() {
        let stats = DatabaseStats::new();
        stats.record_read(true);
        stats.record_read(false);
        stats.record_read(true);
        stats.record_read(true);

        let snap = stats.snapshot();
        assert_eq!(snap.reads, 4);
        assert_eq!(snap.cache_hits, 3);
        assert_eq!(snap.cache_misses, 1);
        assert!((snap.cache_hit_ratio() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn record_transactions() {
        let stats = DatabaseStats::new();
        stats.record_commit();
        stats.record_rollback();
        stats.record_rollback();
        stats.record_commit_failure();

        let snap = stats.snapshot();
        assert_eq!(snap.transactions_committed, 1);
        assert_eq!(snap.transactions_rolled_back, 2);
        assert_eq!(snap.commit_failures, 1);
    }

    #[test]
    fn concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(DatabaseStats::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let s = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    s.record_write();
                    s.record_scan();
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        let snap = stats.snapshot();
        assert_eq!(snap.writes, 1000);
        assert_eq!(snap.scans, 1000);
    }
}
