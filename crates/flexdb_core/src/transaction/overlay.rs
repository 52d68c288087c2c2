//! Staged changes of one transaction.

use crate::entity::EntityRef;
use std::collections::HashMap;

/// A pending change to one record.
#[derive(Debug, Clone)]
pub enum PendingWrite {
    /// Insert or replace the record.
    Put(EntityRef),
    /// Delete the record (tombstone).
    Delete,
}

/// Pending writes grouped by entity type, then id.
///
/// Each (type, id) holds at most one write; staging again replaces it.
#[derive(Debug, Default)]
pub struct Overlay {
    writes: HashMap<String, HashMap<String, PendingWrite>>,
}

impl Overlay {
    /// Creates an empty overlay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages an upsert keyed by the record's id.
    pub fn put(&mut self, entity_type: &str, record: EntityRef) {
        self.writes
            .entry(entity_type.to_string())
            .or_default()
            .insert(record.id().to_string(), PendingWrite::Put(record));
    }

    /// Stages a tombstone.
    pub fn delete(&mut self, entity_type: &str, id: &str) {
        self.writes
            .entry(entity_type.to_string())
            .or_default()
            .insert(id.to_string(), PendingWrite::Delete);
    }

    /// Returns the staged write for a record, if any.
    #[must_use]
    pub fn get(&self, entity_type: &str, id: &str) -> Option<&PendingWrite> {
        self.writes.get(entity_type)?.get(id)
    }

    /// Returns true if the record has a staged write of either kind.
    #[must_use]
    pub fn touches(&self, entity_type: &str, id: &str) -> bool {
        self.get(entity_type, id).is_some()
    }

    /// Staged writes for one type.
    pub fn writes_for<'a>(
        &'a self,
        entity_type: &str,
    ) -> impl Iterator<Item = (&'a str, &'a PendingWrite)> + 'a {
        self.writes
            .get(entity_type)
            .into_iter()
            .flat_map(|writes| writes.iter().map(|(id, w)| (id.as_str(), w)))
    }

    /// Staged upserts for one type.
    pub fn records_for<'a>(&'a self, entity_type: &str) -> impl Iterator<Item = &'a EntityRef> + 'a {
        self.writes_for(entity_type).filter_map(|(_, write)| match write {
            PendingWrite::Put(record) => Some(record),
            PendingWrite::Delete => None,
        })
    }

    /// Every staged write as (type, id, write).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &PendingWrite)> {
        self.writes.iter().flat_map(|(ty, writes)| {
            writes
                .iter()
                .map(move |(id, write)| (ty.as_str(), id.as_str(), write))
        })
    }

    /// Number of staged writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.values().map(HashMap::len).sum()
    }

    /// Returns true if nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.values().all(HashMap::is_empty)
    }

    /// Discards everything.
    pub fn clear(&mut self) {
        self.writes.clear();
    }
}
