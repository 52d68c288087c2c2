//! Query command implementation.

use crate::commands::{parse_assignment, require_database, RecordView};
use flexdb_core::{Database, EntityRef};
use std::path::Path;
use tracing::debug;

/// Parsed query options.
#[derive(Debug, Default)]
pub struct QueryArgs {
    /// `field=value` equality filters.
    pub filters: Vec<String>,
    /// `field=text` substring filter.
    pub like: Option<String>,
    /// Field to order by.
    pub order_by: Option<String>,
    /// Order descending.
    pub descending: bool,
    /// Results to skip.
    pub offset: usize,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Fields to index before running.
    pub indexes: Vec<String>,
}

/// Runs the query and prints matching records as a JSON array.
pub fn run(
    path: &Path,
    entity_type: &str,
    args: &QueryArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    require_database(path)?;
    let db = Database::open(path)?;

    let views: Vec<_> = execute(&db, entity_type, args)?
        .iter()
        .map(|r| RecordView::of(r.as_ref()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&views)?);
    Ok(())
}

/// Builds and executes the query against `db`.
pub fn execute(
    db: &Database,
    entity_type: &str,
    args: &QueryArgs,
) -> Result<Vec<EntityRef>, Box<dyn std::error::Error>> {
    for field in &args.indexes {
        let indexed = db.add_index(entity_type, field);
        debug!(field = field.as_str(), indexed, "built index");
    }

    let tx = db.begin_read();
    let mut query = tx.query(entity_type);
    for filter in &args.filters {
        let (field, value) = parse_assignment(filter)?;
        query = query.where_eq(&field, value);
    }
    if let Some(like) = &args.like {
        let (field, value) = parse_assignment(like)?;
        let text = match value.as_text() {
            Some(text) => text.to_string(),
            None => value.to_string(),
        };
        query = query.where_like(&field, text);
    }
    if let Some(field) = &args.order_by {
        query = query.order_by(field, args.descending);
    }
    query = query.offset(args.offset);
    if let Some(limit) = args.limit {
        query = query.limit(limit);
    }

    Ok(query.execute()?)
}
