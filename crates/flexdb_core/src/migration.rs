//! Versioned schema migrations.
//!
//! Migrations are registered on a database and applied with
//! [`Database::migrate`]. The highest applied version is kept in a marker
//! record (id `current_version` in entity type `migration`, field
//! `version`), written in the same transaction as the migrations
//! themselves, so a run either applies every pending step or none.
//!
//! ```rust
//! use flexdb_core::{Database, Record};
//!
//! let db = Database::open_in_memory().unwrap();
//! db.add_migration(
//!     1,
//!     |tx| tx.set("settings", Record::new("theme").with("value", "dark")),
//!     |tx| tx.delete("settings", "theme"),
//! );
//!
//! let report = db.migrate(1).unwrap();
//! assert_eq!(report.applied, vec![1]);
//! assert_eq!(db.migration_version().unwrap(), 1);
//! ```
//!
//! `migrate` never runs down-functions; rolling a schema back is the
//! explicit [`Database::revert`].

use crate::database::Database;
use crate::entity::Record;
use crate::error::{CoreError, CoreResult};
use crate::transaction::Transaction;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Version number for migrations.
pub type MigrationVersion = u64;

/// Entity type holding the version marker.
pub const MARKER_TYPE: &str = "migration";
/// Id of the version marker record.
pub const MARKER_ID: &str = "current_version";
/// Field of the version marker holding the version.
pub const MARKER_FIELD: &str = "version";

/// Trait for defining migrations.
pub trait Migration: Send + Sync {
    /// Returns the version number for this migration.
    ///
    /// Version 0 means "nothing applied" and is never run.
    fn version(&self) -> MigrationVersion;

    /// Returns the name of this migration.
    fn name(&self) -> &str;

    /// Returns an optional description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Applies the migration inside the running transaction.
    fn up(&self, tx: &mut Transaction<'_>) -> CoreResult<()>;

    /// Undoes the migration. Fails unless overridden.
    fn down(&self, _tx: &mut Transaction<'_>) -> CoreResult<()> {
        Err(CoreError::migration_failed(format!(
            "migration {} ({}) cannot be reverted",
            self.version(),
            self.name()
        )))
    }
}

type MigrationFn = dyn Fn(&mut Transaction<'_>) -> CoreResult<()> + Send + Sync;

/// A migration built from closures.
pub struct FnMigration {
    version: MigrationVersion,
    name: String,
    up: Box<MigrationFn>,
    down: Box<MigrationFn>,
}

impl FnMigration {
    /// Creates a migration named `migration_<version>`.
    pub fn new<U, D>(version: MigrationVersion, up: U, down: D) -> Self
    where
        U: Fn(&mut Transaction<'_>) -> CoreResult<()> + Send + Sync + 'static,
        D: Fn(&mut Transaction<'_>) -> CoreResult<()> + Send + Sync + 'static,
    {
        Self {
            version,
            name: format!("migration_{version}"),
            up: Box::new(up),
            down: Box::new(down),
        }
    }

    /// Renames the migration.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Migration for FnMigration {
    fn version(&self) -> MigrationVersion {
        self.version
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn up(&self, tx: &mut Transaction<'_>) -> CoreResult<()> {
        (self.up)(tx)
    }

    fn down(&self, tx: &mut Transaction<'_>) -> CoreResult<()> {
        (self.down)(tx)
    }
}

impl fmt::Debug for FnMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMigration")
            .field("version", &self.version)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Information about a migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationInfo {
    /// Version number.
    pub version: MigrationVersion,
    /// Human-readable name.
    pub name: String,
    /// Description of what this migration does.
    pub description: Option<String>,
}

impl MigrationInfo {
    fn of(migration: &dyn Migration) -> Self {
        Self {
            version: migration.version(),
            name: migration.name().to_string(),
            description: migration.description().map(String::from),
        }
    }
}

/// Outcome of a migrate or revert run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Marker version before the run.
    pub from: MigrationVersion,
    /// Marker version after the run.
    pub to: MigrationVersion,
    /// Versions whose up (or down) function ran, in execution order.
    pub applied: Vec<MigrationVersion>,
}

impl MigrationReport {
    fn unchanged(version: MigrationVersion) -> Self {
        Self {
            from: version,
            to: version,
            applied: Vec::new(),
        }
    }

    /// Returns true if nothing ran.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty() && self.from == self.to
    }
}

/// Registered migrations, sorted by version.
///
/// Equal versions keep registration order.
#[derive(Default)]
pub struct MigrationRunner {
    migrations: RwLock<Vec<Arc<dyn Migration>>>,
}

impl MigrationRunner {
    /// Creates an empty runner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a migration.
    pub fn register(&self, migration: Arc<dyn Migration>) {
        let mut migrations = self.migrations.write();
        let version = migration.version();
        let at = migrations.partition_point(|m| m.version() <= version);
        migrations.insert(at, migration);
    }

    /// Returns list of registered migrations.
    #[must_use]
    pub fn list(&self) -> Vec<MigrationInfo> {
        self.migrations
            .read()
            .iter()
            .map(|m| MigrationInfo::of(m.as_ref()))
            .collect()
    }

    /// Number of registered migrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.migrations.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.migrations.read().is_empty()
    }

    /// Migrations with `current < version <= target`, ascending.
    #[must_use]
    pub fn pending(&self, current: MigrationVersion, target: MigrationVersion) -> Vec<MigrationInfo> {
        self.between(current, target)
            .iter()
            .map(|m| MigrationInfo::of(m.as_ref()))
            .collect()
    }

    /// Checks that versions are unique and non-zero.
    pub fn validate(&self) -> CoreResult<()> {
        let mut seen = HashSet::new();
        for migration in self.migrations.read().iter() {
            let version = migration.version();
            if version == 0 {
                return Err(CoreError::migration_failed(format!(
                    "migration `{}` uses reserved version 0",
                    migration.name()
                )));
            }
            if !seen.insert(version) {
                return Err(CoreError::migration_failed(format!(
                    "migration version {version} registered more than once"
                )));
            }
        }
        Ok(())
    }

    fn between(&self, above: MigrationVersion, upto: MigrationVersion) -> Vec<Arc<dyn Migration>> {
        self.migrations
            .read()
            .iter()
            .filter(|m| m.version() > above && m.version() <= upto)
            .map(Arc::clone)
            .collect()
    }

    /// Applies pending migrations up to `target` in one transaction.
    pub(crate) fn migrate(&self, db: &Database, target: MigrationVersion) -> CoreResult<MigrationReport> {
        let current = read_version(&db.begin_read())?;
        if self.between(current, target).is_empty() {
            tracing::debug!(current, target, "no pending migrations");
            return Ok(MigrationReport::unchanged(current));
        }

        let mut tx = db.begin_write();
        let from = read_version(&tx)?;
        let pending = self.between(from, target);

        let mut applied = Vec::with_capacity(pending.len());
        for migration in &pending {
            let version = migration.version();
            migration.up(&mut tx).map_err(|e| {
                CoreError::migration_failed(format!(
                    "migration {version} ({}) failed: {e}",
                    migration.name()
                ))
            })?;
            write_version(&mut tx, version)?;
            applied.push(version);
            tracing::debug!(version, name = migration.name(), "applied migration");
        }

        tx.commit()?;
        let to = applied.last().copied().unwrap_or(from);
        tracing::info!(from, to, count = applied.len(), "migrations applied");
        Ok(MigrationReport { from, to, applied })
    }

    /// Runs down-functions for `target < version <= current`, descending,
    /// in one transaction, and moves the marker to `target`.
    pub(crate) fn revert(&self, db: &Database, target: MigrationVersion) -> CoreResult<MigrationReport> {
        let current = read_version(&db.begin_read())?;
        if target >= current {
            return Ok(MigrationReport::unchanged(current));
        }

        let mut tx = db.begin_write();
        let from = read_version(&tx)?;

        let mut reverted = Vec::new();
        for migration in self.between(target, from).iter().rev() {
            let version = migration.version();
            migration.down(&mut tx).map_err(|e| {
                CoreError::migration_failed(format!(
                    "reverting migration {version} ({}) failed: {e}",
                    migration.name()
                ))
            })?;
            reverted.push(version);
        }

        if target == 0 {
            tx.delete(MARKER_TYPE, MARKER_ID)?;
        } else {
            write_version(&mut tx, target)?;
        }
        tx.commit()?;
        tracing::info!(from, to = target, count = reverted.len(), "migrations reverted");
        Ok(MigrationReport {
            from,
            to: target,
            applied: reverted,
        })
    }
}

impl fmt::Debug for MigrationRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.migrations.read().iter().map(|m| m.version()))
            .finish()
    }
}

/// Reads the marker version as seen by `tx`; absent means 0.
pub(crate) fn read_version(tx: &Transaction<'_>) -> CoreResult<MigrationVersion> {
    let Some(marker) = tx.get(MARKER_TYPE, MARKER_ID) else {
        return Ok(0);
    };
    marker
        .field(MARKER_FIELD)
        .and_then(|v| v.as_integer())
        .and_then(|n| MigrationVersion::try_from(n).ok())
        .ok_or_else(|| {
            CoreError::migration_failed(format!(
                "version marker `{MARKER_TYPE}/{MARKER_ID}` has no valid `{MARKER_FIELD}` field"
            ))
        })
}

fn write_version(tx: &mut Transaction<'_>, version: MigrationVersion) -> CoreResult<()> {
    let version = i64::try_from(version).map_err(|_| {
        CoreError::migration_failed(format!("migration version {version} is out of range"))
    })?;
    tx.set(MARKER_TYPE, Record::new(MARKER_ID).with(MARKER_FIELD, version))
}
