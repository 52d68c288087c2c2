//! Hash index implementation.

use crate::index::IndexKey;
use std::collections::{HashMap, HashSet};

/// Hash-based index for O(1) equality lookups on one field.
///
/// Stores a mapping from key to the set of record ids holding that value,
/// plus the reverse mapping from id to its current key. An id is therefore
/// present in at most one bucket: inserting it under a new key moves it.
/// Empty buckets are removed, so `key_count` only counts live values.
///
/// # Example
///
/// ```rust
/// use flexdb_core::index::{HashIndex, IndexKey};
/// use flexdb_codec::Value;
///
/// let mut index = HashIndex::new("Name");
/// let alice = IndexKey::from_value(&Value::from("Alice"));
/// index.insert(alice.clone(), "1");
///
/// assert_eq!(index.lookup(&alice), vec!["1".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HashIndex {
    /// Indexed field name.
    field: String,
    /// Key to record ids mapping.
    entries: HashMap<IndexKey, HashSet<String>>,
    /// Record id to its current key.
    keys: HashMap<String, IndexKey>,
}

impl HashIndex {
    /// Creates an empty index on `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            entries: HashMap::new(),
            keys: HashMap::new(),
        }
    }

    /// Returns the indexed field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Rebuilds the index from a set of key-id pairs.
    pub fn rebuild<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (IndexKey, S)>,
        S: Into<String>,
    {
        self.clear();
        for (key, id) in entries {
            self.insert(key, id);
        }
    }

    /// Places `id` under `key`, removing it from any other bucket.
    ///
    /// Returns false if `id` was already under `key`.
    pub fn insert(&mut self, key: IndexKey, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.keys.get(&id) == Some(&key) {
            return false;
        }
        self.remove_id(&id);
        self.entries.entry(key.clone()).or_default().insert(id.clone());
        self.keys.insert(id, key);
        true
    }

    /// Removes `id` from whichever bucket holds it, returning that key.
    pub fn remove_id(&mut self, id: &str) -> Option<IndexKey> {
        let key = self.keys.remove(id)?;
        if let Some(set) = self.entries.get_mut(&key) {
            set.remove(id);
            if set.is_empty() {
                self.entries.remove(&key);
            }
        }
        Some(key)
    }

    /// Looks up record ids by exact key.
    #[must_use]
    pub fn lookup(&self, key: &IndexKey) -> Vec<String> {
        self.entries
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the bucket for a key, if any.
    #[must_use]
    pub fn bucket(&self, key: &IndexKey) -> Option<&HashSet<String>> {
        self.entries.get(key)
    }

    /// Returns the key an id is currently indexed under.
    #[must_use]
    pub fn key_of(&self, id: &str) -> Option<&IndexKey> {
        self.keys.get(id)
    }

    /// Checks if the index contains a key.
    #[must_use]
    pub fn contains(&self, key: &IndexKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates over every (key, id) pair.
    pub fn iter(&self) -> impl Iterator<Item = (&IndexKey, &str)> {
        self.entries
            .iter()
            .flat_map(|(key, ids)| ids.iter().map(move |id| (key, id.as_str())))
    }

    /// Returns the number of indexed ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the number of distinct keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    /// Clears the index.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.keys.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexdb_codec::Value;

    fn key(v: impl Into<Value>) -> IndexKey {
        IndexKey::from_value(&v.into())
    }

    #[test]
    fn insert_and_lookup() {
        let mut index = HashIndex::new("Name");

        index.insert(key("Alice"), "1");

        let found = index.lookup(&key("Alice"));
        assert_eq!(found, vec!["1".to_string()]);
        assert_eq!(index.field(), "Name");
        assert_eq!(index.key_of("1"), Some(&key("Alice")));
    }

    #[test]
    fn lookup_missing() {
        let index = HashIndex::new("Name");
        assert!(index.lookup(&key("missing")).is_empty());
    }

    #[test]
    fn multiple_ids_same_key() {
        let mut index = HashIndex::new("Value");

        index.insert(key(25), "1");
        index.insert(key(25), "2");

        let mut found = index.lookup(&key(25));
        found.sort();
        assert_eq!(found, vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn duplicate_insert_is_counted_once() {
        let mut index = HashIndex::new("Value");

        assert!(index.insert(key(1), "a"));
        assert!(!index.insert(key(1), "a"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn reinsert_under_new_key_moves_id() {
        let mut index = HashIndex::new("Name");

        index.insert(key("Alice"), "1");
        index.insert(key("Alicia"), "1");

        assert!(index.lookup(&key("Alice")).is_empty());
        assert_eq!(index.lookup(&key("Alicia")), vec!["1".to_string()]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.key_count(), 1);
    }

    #[test]
    fn remove_id_drops_empty_bucket() {
        let mut index = HashIndex::new("Name");

        index.insert(key("k"), "1");
        assert!(index.contains(&key("k")));

        assert_eq!(index.remove_id("1"), Some(key("k")));
        assert!(!index.contains(&key("k")));
        assert_eq!(index.key_count(), 0);
    }

    #[test]
    fn remove_one_of_many() {
        let mut index = HashIndex::new("Name");

        index.insert(key("k"), "1");
        index.insert(key("k"), "2");
        index.remove_id("1");

        assert_eq!(index.lookup(&key("k")), vec!["2".to_string()]);
    }

    #[test]
    fn remove_absent_is_none() {
        let mut index = HashIndex::new("Name");
        index.insert(key("k"), "1");

        assert!(index.remove_id("2").is_none());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn len_and_clear() {
        let mut index = HashIndex::new("Value");

        for i in 0..5 {
            index.insert(key(i), format!("id{i}"));
        }

        assert_eq!(index.len(), 5);
        assert!(!index.is_empty());

        index.clear();

        assert_eq!(index.len(), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn rebuild_index() {
        let mut index = HashIndex::new("Name");
        index.insert(key("old"), "0");

        index.rebuild(vec![(key("a"), "1"), (key("b"), "2"), (key("c"), "3")]);

        assert_eq!(index.len(), 3);
        assert!(!index.contains(&key("old")));
        assert!(index.contains(&key("a")));
    }

    #[test]
    fn iter_visits_every_pair() {
        let mut index = HashIndex::new("Value");
        index.insert(key(1), "a");
        index.insert(key(1), "b");
        index.insert(key(2), "c");

        assert_eq!(index.iter().count(), 3);
    }
}
