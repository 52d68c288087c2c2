//! Comparable rendering of field values.

use flexdb_codec::Value;
use std::fmt;

/// Canonical bucket key for a field value.
///
/// Two values share a key exactly when queries treat them as equal.
/// Integral floats render as integers, so `25` and `25.0` land in the same
/// bucket. Arrays and maps render as their JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexKey(String);

impl IndexKey {
    /// Renders the key for a value.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let rendered = match value {
            Value::Null => String::from("null"),
            Value::Bool(b) => format!("b:{b}"),
            Value::Integer(n) => format!("n:{n}"),
            Value::Float(f) => match value.as_integer() {
                Some(n) => format!("n:{n}"),
                None => format!("f:{f}"),
            },
            Value::Text(s) => format!("s:{s}"),
            Value::Array(_) | Value::Map(_) => format!("j:{value}"),
        };
        Self(rendered)
    }

    /// Returns the rendered key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Value> for IndexKey {
    fn from(value: &Value) -> Self {
        Self::from_value(value)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(v: impl Into<Value>) -> IndexKey {
        IndexKey::from_value(&v.into())
    }

    #[test]
    fn kinds_never_collide() {
        assert_ne!(key("1"), key(1));
        assert_ne!(key("true"), key(true));
        assert_ne!(key("null"), IndexKey::from_value(&Value::Null));
    }

    #[test]
    fn whole_floats_match_integers() {
        assert_eq!(key(25), key(25.0));
        assert_eq!(key(0), key(-0.0));
        assert_ne!(key(25), key(25.5));
    }

    #[test]
    fn composite_values_render_as_json() {
        assert_eq!(key(vec![1, 2]).as_str(), "j:[1,2]");
        assert_eq!(key(vec![1, 2]), key(vec![1, 2]));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn integer_and_widened_float_share_a_key(n in -1_000_000i64..1_000_000) {
                #[allow(clippy::cast_precision_loss)]
                let widened = n as f64;
                prop_assert_eq!(key(n), key(widened));
            }

            #[test]
            fn text_never_matches_a_number(n in any::<i64>()) {
                prop_assert_ne!(key(n.to_string()), key(n));
            }
        }
    }
}
