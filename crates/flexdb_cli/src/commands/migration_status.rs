//! Migration status command.

use crate::commands::require_database;
use flexdb_core::migration::{MARKER_ID, MARKER_TYPE};
use flexdb_core::Database;
use std::path::Path;
use tracing::info;

/// Shows the committed migration version.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    require_database(path)?;
    info!("Checking migration status for {:?}", path);

    let db = Database::open(path)?;
    let version = db.migration_version()?;

    println!("Migration Status");
    println!("================");
    if version == 0 {
        println!("  No migrations applied.");
    } else {
        println!("  Current version: {version}");
        println!("  Marker record:   {MARKER_TYPE}/{MARKER_ID}");
    }

    Ok(())
}
