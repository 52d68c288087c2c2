//! Generic attribute-map record.

use crate::entity::Entity;
use flexdb_codec::{FieldMap, Value};

/// A record whose fields are an open attribute map.
///
/// Every record loaded from a snapshot is materialized as a `Record`.
///
/// ```rust
/// use flexdb_core::{Entity, Record};
/// use flexdb_codec::Value;
///
/// let alice = Record::new("1").with("Name", "Alice").with("Value", 30);
/// assert_eq!(alice.id(), "1");
/// assert_eq!(alice.field("Value"), Some(Value::Integer(30)));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    id: String,
    fields: FieldMap,
}

impl Record {
    /// Creates a record with no fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: FieldMap::new(),
        }
    }

    /// Creates a record from an existing field map.
    pub fn from_fields(id: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Builder-style field assignment.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Sets a field, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Borrows a field without cloning.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Borrows all fields.
    #[must_use]
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }
}

impl Entity for Record {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn to_fields(&self) -> FieldMap {
        self.fields.clone()
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityRef;
    use std::sync::Arc;

    #[test]
    fn builder_sets_fields() {
        let record = Record::new("7").with("Name", "Bob").with("Value", 25);

        assert_eq!(record.get("Name"), Some(&Value::from("Bob")));
        assert_eq!(record.field("Value"), Some(Value::Integer(25)));
        assert_eq!(record.field("Missing"), None);
    }

    #[test]
    fn insert_and_remove() {
        let mut record = Record::new("1");
        assert!(record.insert("a", 1).is_none());
        assert_eq!(record.insert("a", 2), Some(Value::Integer(1)));
        assert_eq!(record.remove("a"), Some(Value::Integer(2)));
        assert!(record.fields().is_empty());
    }

    #[test]
    fn set_id_before_write() {
        let mut record = Record::default();
        record.set_id("assigned".to_string());
        assert_eq!(record.id(), "assigned");
    }

    #[test]
    fn downcast_through_trait_object() {
        let entity: EntityRef = Arc::new(Record::new("1").with("x", true));

        let record = entity.downcast_ref::<Record>().unwrap();
        assert_eq!(record.get("x"), Some(&Value::Bool(true)));
    }

    #[test]
    fn field_eq_compares_id_and_fields() {
        let a: EntityRef = Arc::new(Record::new("1").with("x", 1));
        let b: EntityRef = Arc::new(Record::new("1").with("x", 1));
        let c: EntityRef = Arc::new(Record::new("1").with("x", 2));

        assert!(a.field_eq(b.as_ref()));
        assert!(!a.field_eq(c.as_ref()));
    }
}
