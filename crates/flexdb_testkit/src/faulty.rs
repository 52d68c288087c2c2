//! A snapshot backend with switchable write failures.

use flexdb_storage::{InMemoryBackend, SnapshotBackend, StorageError, StorageResult};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Shared {
    inner: InMemoryBackend,
    failing: AtomicBool,
    rejected: AtomicU64,
}

/// In-memory backend whose `store` can be made to fail.
///
/// Clones share state, so a test keeps one handle and gives the other to
/// the database.
///
/// ```rust
/// use flexdb_storage::SnapshotBackend;
/// use flexdb_testkit::FaultyBackend;
///
/// let backend = FaultyBackend::new();
/// backend.fail_writes(true);
/// assert!(backend.store(b"{}").is_err());
/// assert_eq!(backend.rejected_writes(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FaultyBackend {
    shared: Arc<Shared>,
}

impl FaultyBackend {
    /// Creates a backend that accepts writes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent writes fail (or succeed again).
    pub fn fail_writes(&self, failing: bool) {
        self.shared.failing.store(failing, Ordering::SeqCst);
    }

    /// Returns true while writes fail.
    #[must_use]
    pub fn is_failing(&self) -> bool {
        self.shared.failing.load(Ordering::SeqCst)
    }

    /// Number of writes refused so far.
    #[must_use]
    pub fn rejected_writes(&self) -> u64 {
        self.shared.rejected.load(Ordering::SeqCst)
    }

    /// Number of writes accepted so far.
    #[must_use]
    pub fn accepted_writes(&self) -> u64 {
        self.shared.inner.store_count()
    }

    /// The last accepted snapshot bytes.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.shared.inner.data()
    }
}

impl SnapshotBackend for FaultyBackend {
    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        self.shared.inner.load()
    }

    fn store(&self, data: &[u8]) -> StorageResult<()> {
        if self.is_failing() {
            self.shared.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(StorageError::Unavailable("injected write failure".into()));
        }
        self.shared.inner.store(data)
    }

    fn describe(&self) -> String {
        String::from("faulty memory")
    }
}
