//! Property-based test generators using proptest.
//!
//! Ids, names and values are drawn from small pools so that generated
//! operations collide on the same records and index buckets.

use crate::fixtures::TestEntity;
use proptest::prelude::*;

/// Fields of [`TestEntity`] that can be indexed.
pub const INDEXABLE_FIELDS: [&str; 2] = ["Name", "Value"];

/// Pool of names used by the generators.
pub const NAMES: [&str; 4] = ["Alice", "Bob", "Charlie", "Dana"];

/// Upper bound (exclusive) of generated `Value` fields.
pub const VALUE_RANGE: i64 = 5;

/// An operation against a write transaction.
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Stage an upsert.
    Set(TestEntity),
    /// Stage a delete.
    Delete {
        /// Record id.
        id: String,
    },
    /// Build an index on a field.
    AddIndex {
        /// Field name.
        field: &'static str,
    },
    /// Commit and start a new transaction.
    Commit,
    /// Roll back and start a new transaction.
    Rollback,
}

/// Strategy for generating ids from a pool of eight.
pub fn id_strategy() -> impl Strategy<Value = String> {
    (0u8..8).prop_map(|n| n.to_string())
}

/// Strategy for generating test entities.
pub fn test_entity_strategy() -> impl Strategy<Value = TestEntity> {
    (id_strategy(), prop::sample::select(NAMES.to_vec()), 0..VALUE_RANGE)
        .prop_map(|(id, name, value)| TestEntity::new(id, name, value))
}

/// Strategy for generating indexable field names.
pub fn field_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(INDEXABLE_FIELDS.to_vec())
}

/// Strategy for generating store operations.
pub fn store_operation_strategy() -> impl Strategy<Value = StoreOperation> {
    prop_oneof![
        6 => test_entity_strategy().prop_map(StoreOperation::Set),
        3 => id_strategy().prop_map(|id| StoreOperation::Delete { id }),
        1 => field_strategy().prop_map(|field| StoreOperation::AddIndex { field }),
        2 => Just(StoreOperation::Commit),
        1 => Just(StoreOperation::Rollback),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(store_operation_strategy(), min_ops..max_ops)
}

/// Strategy for generating only staged writes (no commit, rollback or
/// index changes).
pub fn staged_write_strategy(max_ops: usize) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(
        prop_oneof![
            2 => test_entity_strategy().prop_map(StoreOperation::Set),
            1 => id_strategy().prop_map(|id| StoreOperation::Delete { id }),
        ],
        1..max_ops,
    )
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn entities_come_from_the_pools(entity in test_entity_strategy()) {
            prop_assert!(NAMES.contains(&entity.name.as_str()));
            prop_assert!((0..VALUE_RANGE).contains(&entity.value));
            prop_assert!(entity.id.parse::<u8>().is_ok_and(|n| n < 8));
        }

        #[test]
        fn staged_writes_never_commit(ops in staged_write_strategy(10)) {
            prop_assert!(!ops.is_empty());
            for op in ops {
                let is_write = matches!(op, StoreOperation::Set(_) | StoreOperation::Delete { .. });
                prop_assert!(is_write);
            }
        }
    }
}
