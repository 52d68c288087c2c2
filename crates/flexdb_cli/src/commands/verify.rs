//! Verify command implementation.

use crate::commands::require_database;
use flexdb_codec::decode_snapshot;
use flexdb_storage::{FileBackend, SnapshotBackend};
use std::path::Path;

/// Outcome of verifying one file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct VerifyResult {
    /// Number of entity types.
    pub entity_types: usize,
    /// Number of records.
    pub records: usize,
    /// Number of types present with no records.
    pub empty_types: usize,
}

/// Runs the verify command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    require_database(path)?;
    println!("Verifying database at {path:?}...");
    println!();

    let result = verify(path)?;

    println!("Snapshot:");
    println!("  Entity types: {}", result.entity_types);
    println!("  Records:      {}", result.records);
    if result.empty_types > 0 {
        println!("  Empty types:  {}", result.empty_types);
    }
    println!();
    println!("Database verification passed.");
    Ok(())
}

/// Reads and decodes the snapshot at `path`.
pub fn verify(path: &Path) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let backend = FileBackend::new(path, false);
    let bytes = backend
        .load()?
        .ok_or_else(|| format!("No database found at {path:?}"))?;
    let snapshot = decode_snapshot(&bytes)?;

    Ok(VerifyResult {
        entity_types: snapshot.len(),
        records: snapshot.values().map(|records| records.len()).sum(),
        empty_types: snapshot.values().filter(|records| records.is_empty()).count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn counts_decoded_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, br#"{"test": {"1": {"Name": "Alice"}, "2": {}}, "empty": {}}"#)
            .unwrap();

        let result = verify(&path).unwrap();

        assert_eq!(
            result,
            VerifyResult {
                entity_types: 2,
                records: 2,
                empty_types: 1,
            }
        );
    }

    #[test]
    fn malformed_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, b"[1, 2, 3]").unwrap();

        assert!(verify(&path).is_err());
    }
}
