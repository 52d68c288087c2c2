//! The entity capability.

use flexdb_codec::{FieldMap, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A shared, immutable handle to a stored entity.
pub type EntityRef = Arc<dyn Entity>;

/// Upcast to `Any` for downcasting trait objects.
///
/// Implemented for every `'static` type; never implement it by hand.
pub trait AsAny {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Trait for types that can be stored as records in FlexDB.
///
/// Implementors must provide:
/// - `id()` / `set_id()`: the record's identity within its entity type
/// - `to_fields()`: the named fields that get persisted
///
/// `field()` defaults to a lookup in `to_fields()`; override it when a
/// direct match is cheaper.
///
/// The id must not change once the record has been written.
///
/// # Example
///
/// ```rust
/// use flexdb_codec::{FieldMap, Value};
/// use flexdb_core::Entity;
///
/// #[derive(Debug, Clone)]
/// struct Task {
///     id: String,
///     title: String,
///     done: bool,
/// }
///
/// impl Entity for Task {
///     fn id(&self) -> &str {
///         &self.id
///     }
///
///     fn set_id(&mut self, id: String) {
///         self.id = id;
///     }
///
///     fn field(&self, name: &str) -> Option<Value> {
///         match name {
///             "title" => Some(Value::from(self.title.as_str())),
///             "done" => Some(Value::Bool(self.done)),
///             _ => None,
///         }
///     }
///
///     fn to_fields(&self) -> FieldMap {
///         let mut fields = FieldMap::new();
///         fields.insert("title".into(), Value::from(self.title.as_str()));
///         fields.insert("done".into(), Value::Bool(self.done));
///         fields
///     }
/// }
/// ```
pub trait Entity: AsAny + fmt::Debug + Send + Sync {
    /// Returns the record's identifier.
    fn id(&self) -> &str;

    /// Assigns the record's identifier. Only meaningful before first write.
    fn set_id(&mut self, id: String);

    /// Returns all persisted fields.
    fn to_fields(&self) -> FieldMap;

    /// Returns the value of one field, or `None` if the record has no such
    /// field.
    fn field(&self, name: &str) -> Option<Value> {
        self.to_fields().remove(name)
    }
}

impl dyn Entity + '_ {
    /// Downcasts to a concrete record type.
    ///
    /// Records loaded from disk are always [`crate::Record`], whatever type
    /// originally wrote them.
    pub fn downcast_ref<T: Entity + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Returns true if both records carry equal ids and fields.
    pub fn field_eq(&self, other: &dyn Entity) -> bool {
        self.id() == other.id() && self.to_fields() == other.to_fields()
    }
}
