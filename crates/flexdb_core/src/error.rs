//! Error types for FlexDB core.

use crate::hooks::HookEvent;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in FlexDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error while opening.
    #[error("storage error: {0}")]
    Storage(#[from] flexdb_storage::StorageError),

    /// Snapshot codec error while opening.
    #[error("codec error: {0}")]
    Codec(#[from] flexdb_codec::CodecError),

    /// A write was attempted on a read-only transaction.
    #[error("cannot {operation} in a read-only transaction")]
    ReadOnlyTransaction {
        /// The refused operation.
        operation: &'static str,
    },

    /// A lifecycle hook refused the operation.
    #[error("{event} hook rejected operation: {reason}")]
    HookRejected {
        /// Event whose hook refused.
        event: HookEvent,
        /// Reason given by the hook.
        reason: String,
    },

    /// Encoding or writing the snapshot failed during commit.
    ///
    /// The transaction is still active and nothing was applied.
    #[error("commit persistence failed: {message}")]
    PersistenceFailed {
        /// Description of the failure.
        message: String,
    },

    /// Migration failed.
    #[error("migration failed: {message}")]
    MigrationFailed {
        /// Description of the failure.
        message: String,
    },

    /// A query filter or ordering could not be evaluated on a field.
    #[error("query on field `{field}` failed: {message}")]
    QueryType {
        /// The field being filtered or ordered on.
        field: String,
        /// Description of the mismatch.
        message: String,
    },

    /// Commit was called on a transaction that already committed.
    #[error("transaction already committed")]
    AlreadyCommitted,

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a hook rejection error.
    pub fn hook_rejected(event: HookEvent, reason: impl Into<String>) -> Self {
        Self::HookRejected {
            event,
            reason: reason.into(),
        }
    }

    /// Creates a persistence failure error.
    pub fn persistence_failed(message: impl Into<String>) -> Self {
        Self::PersistenceFailed {
            message: message.into(),
        }
    }

    /// Creates a migration failed error.
    pub fn migration_failed(message: impl Into<String>) -> Self {
        Self::MigrationFailed {
            message: message.into(),
        }
    }

    /// Creates a query type error.
    pub fn query_type(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueryType {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let err = CoreError::ReadOnlyTransaction { operation: "set" };
        assert_eq!(err.to_string(), "cannot set in a read-only transaction");

        let err = CoreError::hook_rejected(HookEvent::PreSet, "name required");
        assert_eq!(
            err.to_string(),
            "pre-set hook rejected operation: name required"
        );

        let err = CoreError::query_type("Tags", "array has no ordering");
        assert_eq!(
            err.to_string(),
            "query on field `Tags` failed: array has no ordering"
        );
    }
}
