//! Snapshot backend trait definition.

use crate::error::StorageResult;

/// A whole-snapshot storage backend for FlexDB.
///
/// Backends are **opaque byte stores** holding exactly one blob. Every
/// successful commit replaces the blob in full.
///
/// # Invariants
///
/// - `load` returns `None` until the first successful `store`
/// - after `store` returns `Ok`, `load` returns exactly the stored bytes
/// - a failed `store` leaves the previously stored bytes intact
/// - backends must be `Send + Sync` for concurrent access
pub trait SnapshotBackend: Send + Sync {
    /// Loads the stored snapshot.
    ///
    /// Returns `Ok(None)` if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot exists but cannot be read.
    fn load(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Replaces the stored snapshot with `data`.
    ///
    /// After this returns successfully the new snapshot is durable to the
    /// degree the backend supports.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. The previous snapshot must
    /// still be readable in that case.
    fn store(&self, data: &[u8]) -> StorageResult<()>;

    /// Human-readable description of where snapshots go.
    fn describe(&self) -> String {
        String::from("snapshot backend")
    }
}
