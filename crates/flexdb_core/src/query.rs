//! Query builder over a transaction's view of one entity type.
//!
//! Filters are AND-combined and evaluated at [`Query::execute`], followed by
//! ordering, then offset, then limit:
//!
//! ```rust
//! use flexdb_core::{Database, Record};
//!
//! let db = Database::open_in_memory().unwrap();
//! let mut tx = db.begin_write();
//! tx.set("test", Record::new("1").with("Name", "Alice").with("Value", 30)).unwrap();
//! tx.set("test", Record::new("2").with("Name", "Bob").with("Value", 25)).unwrap();
//! tx.set("test", Record::new("3").with("Name", "Charlie").with("Value", 35)).unwrap();
//!
//! let found = tx
//!     .query("test")
//!     .where_like("Name", "li")
//!     .order_by("Value", true)
//!     .execute()
//!     .unwrap();
//! let ids: Vec<_> = found.iter().map(|r| r.id().to_string()).collect();
//! assert_eq!(ids, ["3", "1"]);
//! ```

use crate::entity::{Entity, EntityRef};
use crate::error::{CoreError, CoreResult};
use crate::index::IndexKey;
use crate::transaction::Transaction;
use flexdb_codec::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Filter {
    Eq {
        field: String,
        value: Value,
        key: IndexKey,
    },
    In {
        field: String,
        keys: HashSet<IndexKey>,
    },
    Like {
        field: String,
        needle: String,
    },
}

impl Filter {
    fn matches(&self, record: &dyn Entity) -> CoreResult<bool> {
        match self {
            Filter::Eq { field, key, .. } => Ok(record
                .field(field)
                .is_some_and(|v| IndexKey::from_value(&v) == *key)),
            Filter::In { field, keys } => Ok(record
                .field(field)
                .is_some_and(|v| keys.contains(&IndexKey::from_value(&v)))),
            Filter::Like { field, needle } => match record.field(field) {
                None | Some(Value::Null) => Ok(false),
                Some(value) => match value.textual() {
                    Some(text) => Ok(text.contains(needle.as_str())),
                    None => Err(CoreError::query_type(
                        field.as_str(),
                        format!("cannot match text against {} value", value.kind()),
                    )),
                },
            },
        }
    }
}

/// A lazily evaluated query. Built by [`Transaction::query`].
#[derive(Debug, Clone)]
#[must_use = "a query does nothing until executed"]
pub struct Query<'a> {
    tx: &'a Transaction<'a>,
    entity_type: String,
    filters: Vec<Filter>,
    order: Option<(String, bool)>,
    offset: usize,
    limit: Option<usize>,
}

impl<'a> Query<'a> {
    pub(crate) fn new(tx: &'a Transaction<'a>, entity_type: &str) -> Self {
        Self {
            tx,
            entity_type: entity_type.to_string(),
            filters: Vec::new(),
            order: None,
            offset: 0,
            limit: None,
        }
    }

    /// Keeps records whose `field` equals `value`.
    ///
    /// `25` and `25.0` are equal. Uses the (type, field) index when present.
    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        let key = IndexKey::from_value(&value);
        self.filters.push(Filter::Eq {
            field: field.to_string(),
            value,
            key,
        });
        self
    }

    /// Keeps records whose `field` equals any of `values`.
    pub fn where_in<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let keys = values
            .into_iter()
            .map(|v| IndexKey::from_value(&v.into()))
            .collect();
        self.filters.push(Filter::In {
            field: field.to_string(),
            keys,
        });
        self
    }

    /// Keeps records whose `field` contains `substring` (case-sensitive).
    ///
    /// Numbers and booleans match on their display form. Records without
    /// the field, or with a null value, never match; an array or map value
    /// fails the query.
    pub fn where_like(mut self, field: &str, substring: impl Into<String>) -> Self {
        self.filters.push(Filter::Like {
            field: field.to_string(),
            needle: substring.into(),
        });
        self
    }

    /// Sorts by `field`, stable, descending if `descending`.
    ///
    /// Every result must carry an orderable value for `field`, and all of
    /// them must be mutually comparable; otherwise the query fails.
    pub fn order_by(mut self, field: &str, descending: bool) -> Self {
        self.order = Some((field.to_string(), descending));
        self
    }

    /// Skips the first `n` results.
    pub fn offset(mut self, n: usize) -> Self {
        self.offset = n;
        self
    }

    /// Returns at most `n` results. `limit(0)` removes the limit.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = (n > 0).then_some(n);
        self
    }

    /// Runs the query.
    ///
    /// # Errors
    ///
    /// `QueryType` when a like filter meets a non-textual value or the
    /// ordering field cannot be compared.
    pub fn execute(&self) -> CoreResult<Vec<EntityRef>> {
        let mut results = Vec::new();
        for record in self.candidates() {
            if self.matches(record.as_ref())? {
                results.push(record);
            }
        }

        if let Some((field, descending)) = &self.order {
            results = sort_by_field(results, field, *descending)?;
        }

        Ok(results
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect())
    }

    /// Number of results.
    pub fn count(&self) -> CoreResult<usize> {
        self.execute().map(|r| r.len())
    }

    /// The first result, if any.
    pub fn first(&self) -> CoreResult<Option<EntityRef>> {
        Ok(self.execute()?.into_iter().next())
    }

    fn matches(&self, record: &dyn Entity) -> CoreResult<bool> {
        for filter in &self.filters {
            if !filter.matches(record)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Records to filter: an index bucket merged with the overlay when an
    /// equality filter hits an index, otherwise the whole merged view.
    fn candidates(&self) -> Vec<EntityRef> {
        let store = self.tx.database().store();
        let overlay = self.tx.overlay();

        let indexed = self.filters.iter().find_map(|filter| match filter {
            Filter::Eq { field, value, .. } => {
                store.indexed_records(&self.entity_type, field, value)
            }
            _ => None,
        });

        match indexed {
            Some(committed) => {
                let mut merged: HashMap<String, EntityRef> = committed
                    .into_iter()
                    .filter(|record| !overlay.touches(&self.entity_type, record.id()))
                    .map(|record| (record.id().to_string(), record))
                    .collect();
                for record in overlay.records_for(&self.entity_type) {
                    merged.insert(record.id().to_string(), Arc::clone(record));
                }
                merged.into_values().collect()
            }
            None => self.tx.get_all(&self.entity_type),
        }
    }
}

fn sort_by_field(
    records: Vec<EntityRef>,
    field: &str,
    descending: bool,
) -> CoreResult<Vec<EntityRef>> {
    let mut keyed = Vec::with_capacity(records.len());
    for record in records {
        let value = record.field(field).ok_or_else(|| {
            CoreError::query_type(field, format!("record `{}` has no such field", record.id()))
        })?;
        if !value.is_orderable() {
            return Err(CoreError::query_type(
                field,
                format!("{} values have no ordering", value.kind()),
            ));
        }
        keyed.push((value, record));
    }

    let mut mismatch = None;
    keyed.sort_by(|(a, _), (b, _)| match a.compare(b) {
        Some(ordering) if descending => ordering.reverse(),
        Some(ordering) => ordering,
        None => {
            mismatch.get_or_insert((a.kind(), b.kind()));
            Ordering::Equal
        }
    });
    if let Some((a, b)) = mismatch {
        return Err(CoreError::query_type(
            field,
            format!("cannot compare {a} with {b}"),
        ));
    }

    Ok(keyed.into_iter().map(|(_, record)| record).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::entity::Record;

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        {
            let mut tx = db.begin_write();
            tx.batch_set(
                "test",
                vec![
                    Record::new("1").with("Name", "Alice").with("Value", 30),
                    Record::new("2").with("Name", "Bob").with("Value", 25),
                    Record::new("3").with("Name", "Charlie").with("Value", 35),
                ],
            )
            .unwrap();
            tx.commit().unwrap();
        }
        db
    }

    fn ids(records: &[EntityRef]) -> Vec<String> {
        let mut ids: Vec<_> = records.iter().map(|r| r.id().to_string()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn where_eq_scan() {
        let db = seeded();
        let tx = db.begin_read();

        let found = tx.query("test").where_eq("Value", 25).execute().unwrap();
        assert_eq!(ids(&found), vec!["2"]);
    }

    #[test]
    fn where_eq_matches_whole_float() {
        let db = seeded();
        let tx = db.begin_read();

        let found = tx.query("test").where_eq("Value", 25.0).execute().unwrap();
        assert_eq!(ids(&found), vec!["2"]);
    }

    #[test]
    fn where_eq_uses_index_and_overlay() {
        let db = seeded();
        db.add_index("test", "Value");

        let mut tx = db.begin_write();
        tx.set("test", Record::new("4").with("Name", "Dana").with("Value", 25))
            .unwrap();
        tx.set("test", Record::new("2").with("Name", "Bob").with("Value", 26))
            .unwrap();

        let found = tx.query("test").where_eq("Value", 25).execute().unwrap();
        assert_eq!(ids(&found), vec!["4"]);
        assert!(db.stats().index_lookups >= 1);
    }

    #[test]
    fn indexed_query_applies_remaining_filters() {
        let db = seeded();
        db.add_index("test", "Value");
        let tx = db.begin_read();

        let found = tx
            .query("test")
            .where_eq("Value", 30)
            .where_like("Name", "Bo")
            .execute()
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn where_in_any_value() {
        let db = seeded();
        let tx = db.begin_read();

        let found = tx
            .query("test")
            .where_in("Name", ["Alice", "Charlie", "Zed"])
            .execute()
            .unwrap();
        assert_eq!(ids(&found), vec!["1", "3"]);
    }

    #[test]
    fn where_like_substring() {
        let db = seeded();
        let tx = db.begin_read();

        let found = tx.query("test").where_like("Name", "li").execute().unwrap();
        assert_eq!(ids(&found), vec!["1", "3"]);

        let found = tx.query("test").where_like("Name", "LI").execute().unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn where_like_on_numbers_uses_display_form() {
        let db = seeded();
        let tx = db.begin_read();

        let found = tx.query("test").where_like("Value", "5").execute().unwrap();
        assert_eq!(ids(&found), vec!["2", "3"]);
    }

    #[test]
    fn where_like_on_array_fails() {
        let db = Database::open_in_memory().unwrap();
        let mut tx = db.begin_write();
        tx.set("test", Record::new("1").with("Tags", vec!["a", "b"]))
            .unwrap();

        let err = tx.query("test").where_like("Tags", "a").execute().unwrap_err();
        assert!(matches!(err, CoreError::QueryType { field, .. } if field == "Tags"));
    }

    #[test]
    fn order_by_both_directions() {
        let db = seeded();
        let tx = db.begin_read();

        let asc = tx.query("test").order_by("Value", false).execute().unwrap();
        let asc: Vec<_> = asc.iter().map(|r| r.id()).collect();
        assert_eq!(asc, ["2", "1", "3"]);

        let desc = tx.query("test").order_by("Name", true).execute().unwrap();
        let desc: Vec<_> = desc.iter().map(|r| r.id()).collect();
        assert_eq!(desc, ["3", "2", "1"]);
    }

    #[test]
    fn order_by_missing_field_fails() {
        let db = seeded();
        let tx = db.begin_read();

        let err = tx.query("test").order_by("Age", false).execute().unwrap_err();
        assert!(matches!(err, CoreError::QueryType { .. }));
    }

    #[test]
    fn order_by_mixed_kinds_fails() {
        let db = Database::open_in_memory().unwrap();
        let mut tx = db.begin_write();
        tx.set("test", Record::new("1").with("Value", 1)).unwrap();
        tx.set("test", Record::new("2").with("Value", "two")).unwrap();

        let err = tx.query("test").order_by("Value", false).execute().unwrap_err();
        assert!(matches!(err, CoreError::QueryType { .. }));
    }

    #[test]
    fn order_by_mixes_integers_and_floats() {
        let db = Database::open_in_memory().unwrap();
        let mut tx = db.begin_write();
        tx.set("test", Record::new("a").with("Value", 2)).unwrap();
        tx.set("test", Record::new("b").with("Value", 1.5)).unwrap();

        let found = tx.query("test").order_by("Value", false).execute().unwrap();
        let order: Vec<_> = found.iter().map(|r| r.id()).collect();
        assert_eq!(order, ["b", "a"]);
    }

    #[test]
    fn offset_and_limit_after_ordering() {
        let db = seeded();
        let tx = db.begin_read();

        let page = tx
            .query("test")
            .order_by("Value", false)
            .offset(1)
            .limit(1)
            .execute()
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id(), "1");

        assert!(tx.query("test").offset(10).execute().unwrap().is_empty());
    }

    #[test]
    fn zero_limit_is_unlimited() {
        let db = Database::open_in_memory().unwrap();
        let mut tx = db.begin_write();
        tx.set("t", Record::new("a").with("n", 1)).unwrap();
        tx.set("t", Record::new("b").with("n", 2)).unwrap();

        assert_eq!(tx.query("t").limit(0).count().unwrap(), 2);
        assert_eq!(tx.query("t").limit(5).limit(0).count().unwrap(), 2);
        assert_eq!(tx.query("t").offset(1).limit(0).count().unwrap(), 1);
    }

    #[test]
    fn count_and_first() {
        let db = seeded();
        let tx = db.begin_read();

        assert_eq!(tx.query("test").count().unwrap(), 3);
        assert_eq!(tx.query("other").count().unwrap(), 0);

        let first = tx
            .query("test")
            .order_by("Value", true)
            .first()
            .unwrap()
            .unwrap();
        assert_eq!(first.id(), "3");
    }

    #[test]
    fn filters_combine_with_and() {
        let db = seeded();
        let tx = db.begin_read();

        let found = tx
            .query("test")
            .where_like("Name", "li")
            .where_in("Value", [35, 40])
            .execute()
            .unwrap();
        assert_eq!(ids(&found), vec!["3"]);
    }

    #[test]
    fn query_never_mutates() {
        let db = seeded();
        let tx = db.begin_read();
        let before = db.snapshot();

        tx.query("test").where_eq("Value", 25).execute().unwrap();

        assert_eq!(db.snapshot(), before);
    }
}
