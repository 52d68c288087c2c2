//! Delete command implementation.

use crate::commands::require_database;
use flexdb_core::Database;
use std::path::Path;
use tracing::info;

/// Deletes records in one transaction and commits.
pub fn run(path: &Path, entity_type: &str, ids: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    require_database(path)?;
    let db = Database::open(path)?;

    let deleted = delete(&db, entity_type, ids)?;
    info!(entity_type, deleted, "deleted records");
    println!("Deleted {deleted} of {} record(s) from {entity_type}", ids.len());
    Ok(())
}

/// Deletes the ids that exist and returns how many did.
pub fn delete(db: &Database, entity_type: &str, ids: &[String]) -> flexdb_core::CoreResult<usize> {
    db.transaction(|tx| {
        let existing = ids
            .iter()
            .filter(|id| tx.get(entity_type, id).is_some())
            .count();
        tx.batch_delete(entity_type, ids)?;
        Ok(existing)
    })
}
