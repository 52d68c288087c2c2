//! Inspect command implementation.

use crate::commands::require_database;
use flexdb_core::Database;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Database inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Database path.
    pub path: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Total number of records.
    pub record_count: usize,
    /// Record count per entity type.
    pub entity_types: BTreeMap<String, usize>,
    /// Committed migration version.
    pub migration_version: u64,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    require_database(path)?;
    let result = inspect(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Collects the inspection result for the database at `path`.
pub fn inspect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let db = Database::open(path)?;
    let entity_types = db.entity_counts();

    Ok(InspectResult {
        path: path.display().to_string(),
        file_size: std::fs::metadata(path)?.len(),
        record_count: entity_types.values().sum(),
        entity_types,
        migration_version: db.migration_version()?,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("FlexDB Database: {}", result.path);
    println!("=================={}", "=".repeat(result.path.len()));
    println!();
    println!("File size:         {} bytes", result.file_size);
    println!("Records:           {}", result.record_count);
    println!("Migration version: {}", result.migration_version);

    if !result.entity_types.is_empty() {
        println!();
        println!("Entity Types:");
        for (name, count) in &result.entity_types {
            println!("  {name}: {count}");
        }
    }
}
