//! # FlexDB Core
//!
//! Core engine for FlexDB, an embedded transactional object store.
//!
//! This crate provides:
//! - The committed entity store with a TTL read cache
//! - Transactions that stage writes in an overlay and commit atomically
//! - A query builder with filters, ordering and pagination
//! - Secondary hash indexes maintained on every commit
//! - Lifecycle hooks around set and delete
//! - Versioned migrations tracked by a persisted marker record
//!
//! ```rust
//! use flexdb_core::{Database, Record};
//!
//! let db = Database::open_in_memory().unwrap();
//! db.transaction(|tx| {
//!     tx.set("test", Record::new("1").with("Name", "Alice").with("Value", 30))?;
//!     tx.set("test", Record::new("2").with("Name", "Bob").with("Value", 25))
//! })
//! .unwrap();
//!
//! let tx = db.begin_read();
//! let bob = tx.query("test").where_eq("Value", 25).first().unwrap().unwrap();
//! assert_eq!(bob.id(), "2");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
mod config;
mod database;
mod entity;
mod error;
pub mod hooks;
pub mod index;
pub mod migration;
mod query;
mod stats;
pub mod transaction;

pub use cache::ReadCache;
pub use config::Config;
pub use database::Database;
pub use entity::{AsAny, Entity, EntityRef, EntityStore, Record};
pub use error::{CoreError, CoreResult};
pub use hooks::{Hook, HookEvent};
pub use migration::{FnMigration, Migration, MigrationInfo, MigrationReport, MigrationVersion};
pub use query::Query;
pub use stats::{DatabaseStats, StatsSnapshot};
pub use transaction::{Transaction, TransactionState};

// Re-export codec types for convenience
pub use flexdb_codec::{FieldMap, Snapshot, Value};
