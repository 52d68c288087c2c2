//! Per-type index registry and commit-time maintenance.

use crate::entity::{Entity, EntityRef};
use crate::index::{HashIndex, IndexKey};
use flexdb_codec::Value;
use std::collections::HashMap;

/// All secondary indexes of one store, keyed by (entity type, field).
///
/// Not synchronized on its own; the owning [`crate::EntityStore`] only
/// touches it under its store-wide lock.
#[derive(Debug, Default)]
pub struct IndexManager {
    indexes: HashMap<String, HashMap<String, HashIndex>>,
}

impl IndexManager {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or rebuilds) the index on `field` from `records`.
    ///
    /// Returns the number of records that were indexed.
    pub fn build<'a, I>(&mut self, entity_type: &str, field: &str, records: I) -> usize
    where
        I: IntoIterator<Item = &'a EntityRef>,
    {
        let mut index = HashIndex::new(field);
        index.rebuild(records.into_iter().filter_map(|record| {
            record
                .field(field)
                .map(|value| (IndexKey::from_value(&value), record.id().to_string()))
        }));
        let indexed = index.len();

        self.indexes
            .entry(entity_type.to_string())
            .or_default()
            .insert(field.to_string(), index);
        indexed
    }

    /// Removes an index. Returns true if it existed.
    pub fn drop_index(&mut self, entity_type: &str, field: &str) -> bool {
        let Some(fields) = self.indexes.get_mut(entity_type) else {
            return false;
        };
        let removed = fields.remove(field).is_some();
        if fields.is_empty() {
            self.indexes.remove(entity_type);
        }
        removed
    }

    /// Returns true if (type, field) is indexed.
    #[must_use]
    pub fn has_index(&self, entity_type: &str, field: &str) -> bool {
        self.get(entity_type, field).is_some()
    }

    /// Returns the index on (type, field), if any.
    #[must_use]
    pub fn get(&self, entity_type: &str, field: &str) -> Option<&HashIndex> {
        self.indexes.get(entity_type)?.get(field)
    }

    /// All (type, field) pairs with an index, sorted.
    #[must_use]
    pub fn definitions(&self) -> Vec<(String, String)> {
        let mut defs: Vec<_> = self
            .indexes
            .iter()
            .flat_map(|(ty, fields)| fields.keys().map(move |f| (ty.clone(), f.clone())))
            .collect();
        defs.sort();
        defs
    }

    /// Ids under `value` in the (type, field) index, or `None` if there is
    /// no such index.
    #[must_use]
    pub fn lookup(&self, entity_type: &str, field: &str, value: &Value) -> Option<Vec<String>> {
        self.get(entity_type, field)
            .map(|index| index.lookup(&IndexKey::from_value(value)))
    }

    /// Re-indexes `record` in every index of its type.
    ///
    /// A record lacking an indexed field is removed from that index.
    pub fn on_upsert(&mut self, entity_type: &str, record: &dyn Entity) {
        let Some(fields) = self.indexes.get_mut(entity_type) else {
            return;
        };
        let id = record.id();
        for (field, index) in fields.iter_mut() {
            match record.field(field) {
                Some(value) => {
                    index.insert(IndexKey::from_value(&value), id);
                }
                None => {
                    index.remove_id(id);
                }
            }
        }
    }

    /// Removes `id` from every index of its type.
    pub fn on_delete(&mut self, entity_type: &str, id: &str) {
        if let Some(fields) = self.indexes.get_mut(entity_type) {
            for index in fields.values_mut() {
                index.remove_id(id);
            }
        }
    }
}
