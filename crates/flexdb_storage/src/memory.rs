//! In-memory snapshot backend for testing.

use crate::backend::SnapshotBackend;
use crate::error::StorageResult;
use parking_lot::RwLock;

/// An in-memory snapshot backend.
///
/// Suitable for unit tests and ephemeral databases that don't need
/// persistence.
///
/// # Example
///
/// ```rust
/// use flexdb_storage::{InMemoryBackend, SnapshotBackend};
///
/// let backend = InMemoryBackend::with_data(b"{\"task\":{}}".to_vec());
/// assert_eq!(backend.store_count(), 0);
/// backend.store(b"{}").unwrap();
/// assert_eq!(backend.store_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: RwLock<Option<Vec<u8>>>,
    stores: RwLock<u64>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that already holds a snapshot.
    ///
    /// Useful for testing load paths.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(Some(data)),
            stores: RwLock::new(0),
        }
    }

    /// Returns a copy of the stored snapshot, if any.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.data.read().clone()
    }

    /// Number of successful `store` calls.
    #[must_use]
    pub fn store_count(&self) -> u64 {
        *self.stores.read()
    }
}

impl SnapshotBackend for InMemoryBackend {
    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.data.read().clone())
    }

    fn store(&self, data: &[u8]) -> StorageResult<()> {
        *self.data.write() = Some(data.to_vec());
        *self.stores.write() += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        String::from("memory")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_backend_is_empty() {
        let backend = InMemoryBackend::new();
        assert!(backend.load().unwrap().is_none());
        assert_eq!(backend.store_count(), 0);
    }

    #[test]
    fn store_replaces_previous() {
        let backend = InMemoryBackend::new();
        backend.store(b"first").unwrap();
        backend.store(b"second").unwrap();

        assert_eq!(backend.load().unwrap(), Some(b"second".to_vec()));
        assert_eq!(backend.store_count(), 2);
    }

    #[test]
    fn with_data_preloads() {
        let backend = InMemoryBackend::with_data(b"seed".to_vec());
        assert_eq!(backend.data(), Some(b"seed".to_vec()));
    }
}
