//! Canonical committed state.

use crate::cache::ReadCache;
use crate::entity::{EntityRef, Record};
use crate::error::{CoreError, CoreResult};
use crate::index::IndexManager;
use crate::stats::DatabaseStats;
use crate::transaction::{Overlay, PendingWrite};
use flexdb_codec::{encode_snapshot, Snapshot, Value};
use flexdb_storage::SnapshotBackend;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Default)]
struct StoreState {
    /// Entity type → id → record.
    data: HashMap<String, HashMap<String, EntityRef>>,
    indexes: IndexManager,
}

impl StoreState {
    /// Encodes the committed records, skipping types with no records.
    fn to_snapshot(&self) -> Snapshot {
        self.data
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(ty, records)| {
                let records = records
                    .iter()
                    .map(|(id, record)| (id.clone(), record.to_fields()))
                    .collect();
                (ty.clone(), records)
            })
            .collect()
    }
}

/// Owns the committed records, their secondary indexes and the read cache.
///
/// Every mutation happens under the exclusive form of one store-wide lock,
/// so no reader can see a record change without the matching index change.
/// The cache is only touched while that lock is held in either form.
#[derive(Debug)]
pub struct EntityStore {
    state: RwLock<StoreState>,
    cache: ReadCache,
    stats: DatabaseStats,
}

impl EntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(cache: ReadCache) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            cache,
            stats: DatabaseStats::new(),
        }
    }

    /// Creates a store holding the records of a decoded snapshot.
    ///
    /// Every record becomes a [`Record`].
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot, cache: ReadCache) -> Self {
        let data = snapshot
            .into_iter()
            .map(|(ty, records)| {
                let records = records
                    .into_iter()
                    .map(|(id, fields)| {
                        let record: EntityRef = Arc::new(Record::from_fields(id.clone(), fields));
                        (id, record)
                    })
                    .collect();
                (ty, records)
            })
            .collect();

        Self {
            state: RwLock::new(StoreState {
                data,
                indexes: IndexManager::new(),
            }),
            cache,
            stats: DatabaseStats::new(),
        }
    }

    /// Returns a committed record.
    ///
    /// Served from the cache when an unexpired entry exists; otherwise read
    /// from the canonical map and cached on a hit.
    pub fn get(&self, entity_type: &str, id: &str) -> Option<EntityRef> {
        let state = self.state.read();

        if let Some(hit) = self.cache.get(entity_type, id) {
            self.stats.record_read(true);
            return Some(hit);
        }
        self.stats.record_read(false);

        let record = state.data.get(entity_type)?.get(id).map(Arc::clone)?;
        self.cache.insert(entity_type, id, Arc::clone(&record));
        Some(record)
    }

    /// Returns every committed record of a type, unordered.
    pub fn get_all(&self, entity_type: &str) -> Vec<EntityRef> {
        let state = self.state.read();
        self.stats.record_scan();
        state
            .data
            .get(entity_type)
            .map(|records| records.values().map(Arc::clone).collect())
            .unwrap_or_default()
    }

    /// Builds an index on (type, field) from the records present now.
    ///
    /// An existing index is rebuilt. Returns the number of records indexed.
    pub fn add_index(&self, entity_type: &str, field: &str) -> usize {
        let mut state = self.state.write();
        let state = &mut *state;
        let records = state.data.get(entity_type);
        let indexed = state
            .indexes
            .build(entity_type, field, records.into_iter().flat_map(HashMap::values));
        tracing::debug!(entity_type, field, indexed, "built index");
        indexed
    }

    /// Removes an index. Returns true if it existed.
    pub fn drop_index(&self, entity_type: &str, field: &str) -> bool {
        self.state.write().indexes.drop_index(entity_type, field)
    }

    /// Returns true if (type, field) is indexed.
    #[must_use]
    pub fn has_index(&self, entity_type: &str, field: &str) -> bool {
        self.state.read().indexes.has_index(entity_type, field)
    }

    /// All indexed (type, field) pairs, sorted.
    #[must_use]
    pub fn indexes(&self) -> Vec<(String, String)> {
        self.state.read().indexes.definitions()
    }

    /// Committed ids holding `value` in the (type, field) index, or `None`
    /// without such an index.
    #[must_use]
    pub fn lookup_index(&self, entity_type: &str, field: &str, value: &Value) -> Option<Vec<String>> {
        self.state.read().indexes.lookup(entity_type, field, value)
    }

    /// Resolves an index bucket to records under one read lock.
    pub(crate) fn indexed_records(
        &self,
        entity_type: &str,
        field: &str,
        value: &Value,
    ) -> Option<Vec<EntityRef>> {
        let state = self.state.read();
        let ids = state.indexes.lookup(entity_type, field, value)?;
        self.stats.record_index_lookup();

        let records = state.data.get(entity_type);
        Some(
            ids.iter()
                .filter_map(|id| records.and_then(|r| r.get(id)).map(Arc::clone))
                .collect(),
        )
    }

    /// The committed state in persisted form.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.state.read().to_snapshot()
    }

    /// Number of committed records per type.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.state
            .read()
            .data
            .iter()
            .filter(|(_, records)| !records.is_empty())
            .map(|(ty, records)| (ty.clone(), records.len()))
            .collect()
    }

    /// Total number of committed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().data.values().map(HashMap::len).sum()
    }

    /// Returns true if no records are committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The read cache.
    #[must_use]
    pub fn cache(&self) -> &ReadCache {
        &self.cache
    }

    /// Operation counters.
    #[must_use]
    pub fn stats(&self) -> &DatabaseStats {
        &self.stats
    }

    /// Persists and then applies a transaction's overlay.
    ///
    /// Under the exclusive lock the candidate state (canonical records with
    /// the overlay folded in) is encoded and handed to `backend`. Only when
    /// the backend accepts it is the overlay applied in memory. On failure
    /// nothing changes and `PersistenceFailed` is returned. An empty overlay
    /// returns immediately without touching the backend.
    pub(crate) fn commit(
        &self,
        overlay: &Overlay,
        backend: &dyn SnapshotBackend,
        pretty: bool,
    ) -> CoreResult<()> {
        if overlay.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write();

        let mut candidate = state.to_snapshot();
        for (ty, id, write) in overlay.iter() {
            match write {
                PendingWrite::Put(record) => {
                    candidate
                        .entry(ty.to_string())
                        .or_default()
                        .insert(id.to_string(), record.to_fields());
                }
                PendingWrite::Delete => {
                    if let Some(records) = candidate.get_mut(ty) {
                        records.remove(id);
                        if records.is_empty() {
                            candidate.remove(ty);
                        }
                    }
                }
            }
        }

        let bytes = encode_snapshot(&candidate, pretty).map_err(|e| {
            tracing::warn!(error = %e, "failed to encode snapshot");
            CoreError::persistence_failed(e.to_string())
        })?;
        backend.store(&bytes).map_err(|e| {
            tracing::warn!(error = %e, backend = %backend.describe(), "failed to persist snapshot");
            CoreError::persistence_failed(e.to_string())
        })?;

        self.apply(&mut state, overlay);
        tracing::debug!(writes = overlay.len(), bytes = bytes.len(), "applied commit");
        Ok(())
    }

    fn apply(&self, state: &mut StoreState, overlay: &Overlay) {
        for (ty, id, write) in overlay.iter() {
            match write {
                PendingWrite::Put(record) => {
                    state.indexes.on_upsert(ty, record.as_ref());
                    state
                        .data
                        .entry(ty.to_string())
                        .or_default()
                        .insert(id.to_string(), Arc::clone(record));
                    self.cache.insert(ty, id, Arc::clone(record));
                }
                PendingWrite::Delete => {
                    if let Some(records) = state.data.get_mut(ty) {
                        records.remove(id);
                        if records.is_empty() {
                            state.data.remove(ty);
                        }
                    }
                    state.indexes.on_delete(ty, id);
                    self.cache.invalidate(ty, id);
                }
            }
        }
    }
}
