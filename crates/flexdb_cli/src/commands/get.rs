//! Get command implementation.

use crate::commands::{require_database, CliError, RecordView};
use flexdb_core::Database;
use std::path::Path;

/// Prints one record as pretty JSON.
pub fn run(path: &Path, entity_type: &str, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    require_database(path)?;
    let db = Database::open(path)?;

    let record = db
        .begin_read()
        .get(entity_type, id)
        .ok_or_else(|| CliError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        })?;

    println!(
        "{}",
        serde_json::to_string_pretty(&RecordView::of(record.as_ref()))?
    );
    Ok(())
}
