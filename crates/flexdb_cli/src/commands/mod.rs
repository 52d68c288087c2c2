//! CLI command implementations.

pub mod delete;
pub mod get;
pub mod inspect;
pub mod migration_status;
pub mod query;
pub mod verify;

use flexdb_codec::{FieldMap, Value};
use flexdb_core::Entity;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Errors reported by the CLI itself.
#[derive(Debug, Error)]
pub enum CliError {
    /// No `--path` was given.
    #[error("database path required (use --path)")]
    MissingPath,

    /// The database file does not exist.
    #[error("no database found at {0}")]
    NoDatabase(String),

    /// A requested record does not exist.
    #[error("record {entity_type}/{id} not found")]
    NotFound {
        /// Entity type.
        entity_type: String,
        /// Record id.
        id: String,
    },

    /// A `field=value` argument was malformed.
    #[error("expected FIELD=VALUE, got `{0}`")]
    BadFilter(String),
}

/// A record as printed by the CLI.
#[derive(Debug, Serialize)]
pub struct RecordView {
    /// Record id.
    pub id: String,
    /// Record fields.
    #[serde(flatten)]
    pub fields: FieldMap,
}

impl RecordView {
    /// Captures a record for output.
    pub fn of(record: &dyn Entity) -> Self {
        Self {
            id: record.id().to_string(),
            fields: record.to_fields(),
        }
    }
}

/// Fails unless a database file exists at `path`.
pub fn require_database(path: &Path) -> Result<(), CliError> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::NoDatabase(path.display().to_string()))
    }
}

/// Splits `field=value`, reading the value as JSON when it parses and as
/// text otherwise.
pub fn parse_assignment(arg: &str) -> Result<(String, Value), CliError> {
    let (field, raw) = arg
        .split_once('=')
        .filter(|(field, _)| !field.is_empty())
        .ok_or_else(|| CliError::BadFilter(arg.to_string()))?;
    let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::from(raw));
    Ok((field.to_string(), value))
}
