//! Database facade.

use crate::cache::ReadCache;
use crate::config::Config;
use crate::entity::{Entity, EntityStore};
use crate::error::CoreResult;
use crate::hooks::{into_hook, HookEvent, HookRegistry};
use crate::migration::{
    read_version, FnMigration, Migration, MigrationInfo, MigrationReport, MigrationRunner,
    MigrationVersion,
};
use crate::stats::StatsSnapshot;
use crate::transaction::Transaction;
use flexdb_codec::{decode_snapshot, Snapshot};
use flexdb_storage::{FileBackend, InMemoryBackend, SnapshotBackend};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// The main database handle.
///
/// `Database` is the primary entry point for interacting with FlexDB.
/// It owns:
/// - the entity store with its indexes and read cache
/// - the lifecycle hook registry
/// - the registered migrations
/// - the snapshot backend every commit is persisted to
///
/// Each instance is independent. Share one across threads by reference or
/// through an `Arc`.
///
/// # Opening a Database
///
/// ```rust,no_run
/// use flexdb_core::{Database, Record};
///
/// let db = Database::open("data/app.json")?;
///
/// db.transaction(|tx| {
///     tx.set("users", Record::new("1").with("Name", "Alice"))
/// })?;
/// # Ok::<(), flexdb_core::CoreError>(())
/// ```
///
/// # In-Memory Databases
///
/// For testing, use `Database::open_in_memory()`:
///
/// ```rust
/// let db = flexdb_core::Database::open_in_memory().unwrap();
/// assert!(db.entity_counts().is_empty());
/// ```
pub struct Database {
    /// Configuration.
    config: Config,
    /// Committed records, indexes and cache.
    store: EntityStore,
    /// Lifecycle hooks.
    hooks: HookRegistry,
    /// Registered migrations.
    migrations: MigrationRunner,
    /// Where commits are persisted.
    backend: Box<dyn SnapshotBackend>,
}

impl Database {
    /// Opens the database stored in the JSON file at `path`.
    ///
    /// A missing file opens an empty database; the file is created by the
    /// first commit.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the file cannot be read and `Codec` if its
    /// content is not a valid snapshot.
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a file-backed database with custom configuration.
    ///
    /// ```rust,no_run
    /// use flexdb_core::{Config, Database};
    /// use std::time::Duration;
    ///
    /// let config = Config::default()
    ///     .cache_ttl(Duration::from_secs(30))
    ///     .pretty_print(false);
    ///
    /// let db = Database::open_with_config("data/app.json", config)?;
    /// # Ok::<(), flexdb_core::CoreError>(())
    /// ```
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let backend = FileBackend::new(path.as_ref(), config.sync_on_commit);
        Self::open_with_backend(config, backend)
    }

    /// Opens a database on an arbitrary snapshot backend.
    pub fn open_with_backend(
        config: Config,
        backend: impl SnapshotBackend + 'static,
    ) -> CoreResult<Self> {
        let cache = ReadCache::new(config.cache_ttl, config.cache_sweep_interval);

        let store = match backend.load()? {
            Some(bytes) => EntityStore::from_snapshot(decode_snapshot(&bytes)?, cache),
            None => EntityStore::new(cache),
        };
        tracing::info!(
            backend = %backend.describe(),
            records = store.len(),
            "opened database"
        );

        Ok(Self {
            config,
            store,
            hooks: HookRegistry::new(),
            migrations: MigrationRunner::new(),
            backend: Box::new(backend),
        })
    }

    /// Opens a fresh in-memory database for testing.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open_with_backend(Config::default(), InMemoryBackend::new())
    }

    /// Begins a transaction.
    pub fn begin(&self, read_only: bool) -> Transaction<'_> {
        Transaction::new(self, read_only)
    }

    /// Begins a read-only transaction.
    pub fn begin_read(&self) -> Transaction<'_> {
        self.begin(true)
    }

    /// Begins a write transaction.
    pub fn begin_write(&self) -> Transaction<'_> {
        self.begin(false)
    }

    /// Executes a function within a write transaction.
    ///
    /// If the function returns `Ok`, the transaction is committed.
    /// If it returns `Err`, the transaction is rolled back.
    pub fn transaction<F, T>(&self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> CoreResult<T>,
    {
        let mut tx = self.begin_write();
        match f(&mut tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        }
    }

    /// Builds an index on (type, field) over the current records.
    ///
    /// Re-adding an existing index rebuilds it. Indexes are not persisted.
    pub fn add_index(&self, entity_type: &str, field: &str) -> usize {
        self.store.add_index(entity_type, field)
    }

    /// Removes an index. Returns true if it existed.
    pub fn drop_index(&self, entity_type: &str, field: &str) -> bool {
        self.store.drop_index(entity_type, field)
    }

    /// Returns true if (type, field) is indexed.
    #[must_use]
    pub fn has_index(&self, entity_type: &str, field: &str) -> bool {
        self.store.has_index(entity_type, field)
    }

    /// Registers a lifecycle hook.
    ///
    /// Hooks run in registration order for every transaction of this
    /// database and cannot be removed.
    pub fn register_hook<F>(&self, event: HookEvent, hook: F)
    where
        F: Fn(&mut Transaction<'_>, &str, &dyn Entity) -> CoreResult<()> + Send + Sync + 'static,
    {
        self.hooks.register(event, into_hook(hook));
    }

    /// Registers a migration built from an up and a down closure.
    pub fn add_migration<U, D>(&self, version: MigrationVersion, up: U, down: D)
    where
        U: Fn(&mut Transaction<'_>) -> CoreResult<()> + Send + Sync + 'static,
        D: Fn(&mut Transaction<'_>) -> CoreResult<()> + Send + Sync + 'static,
    {
        self.register_migration(FnMigration::new(version, up, down));
    }

    /// Registers a migration.
    pub fn register_migration(&self, migration: impl Migration + 'static) {
        self.migrations.register(Arc::new(migration));
    }

    /// Applies every pending migration up to `target` in one transaction.
    ///
    /// # Errors
    ///
    /// `MigrationFailed` if the version marker is malformed or a step fails;
    /// nothing is committed in that case.
    pub fn migrate(&self, target: MigrationVersion) -> CoreResult<MigrationReport> {
        self.migrations.migrate(self, target)
    }

    /// Reverts applied migrations above `target` by running their down
    /// functions, newest first, in one transaction.
    pub fn revert(&self, target: MigrationVersion) -> CoreResult<MigrationReport> {
        self.migrations.revert(self, target)
    }

    /// The committed migration version (0 if none).
    pub fn migration_version(&self) -> CoreResult<MigrationVersion> {
        read_version(&self.begin_read())
    }

    /// Migrations a `migrate(target)` would run now.
    pub fn pending_migrations(&self, target: MigrationVersion) -> CoreResult<Vec<MigrationInfo>> {
        let current = self.migration_version()?;
        Ok(self.migrations.pending(current, target))
    }

    /// All registered migrations in run order.
    #[must_use]
    pub fn migrations(&self) -> Vec<MigrationInfo> {
        self.migrations.list()
    }

    /// Checks registered migration versions for duplicates.
    pub fn validate_migrations(&self) -> CoreResult<()> {
        self.migrations.validate()
    }

    /// Drops expired read-cache entries now, returning how many.
    pub fn purge_cache(&self) -> usize {
        self.store.cache().purge_expired()
    }

    /// Returns a snapshot of the operation counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.store.stats().snapshot()
    }

    /// Returns database configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of committed records per entity type.
    #[must_use]
    pub fn entity_counts(&self) -> BTreeMap<String, usize> {
        self.store.counts()
    }

    /// The committed state in persisted form.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// The entity store.
    #[must_use]
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub(crate) fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub(crate) fn backend(&self) -> &dyn SnapshotBackend {
        self.backend.as_ref()
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .field("backend", &self.backend.describe())
            .field("records", &self.store.len())
            .field("indexes", &self.store.indexes())
            .field("hooks", &self.hooks)
            .field("migrations", &self.migrations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Record;
    use crate::error::CoreError;
    use flexdb_codec::Value;
    use std::thread;
    use tempfile::tempdir;

    fn create_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn transaction_isolation() {
        let db = create_db();

        let mut tx = db.begin_write();
        tx.set("test", Record::new("1").with("Value", 42)).unwrap();

        // Uncommitted data not visible outside transaction
        assert!(db.begin_read().get("test", "1").is_none());

        // But visible inside
        assert!(tx.get("test", "1").is_some());

        tx.commit().unwrap();

        // Now visible
        let record = db.begin_read().get("test", "1").unwrap();
        assert_eq!(record.field("Value"), Some(Value::Integer(42)));
    }

    #[test]
    fn closure_transaction_commits_or_rolls_back() {
        let db = create_db();

        db.transaction(|tx| tx.set("test", Record::new("1"))).unwrap();
        let result: CoreResult<()> = db.transaction(|tx| {
            tx.set("test", Record::new("2"))?;
            Err(CoreError::invalid_operation("changed my mind"))
        });

        assert!(result.is_err());
        assert_eq!(db.entity_counts().get("test"), Some(&1));
        assert_eq!(db.stats().transactions_rolled_back, 1);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("db.json");

        {
            let db = Database::open(&path).unwrap();
            db.transaction(|tx| {
                tx.set("test", Record::new("1").with("Name", "Alice").with("Value", 30))?;
                tx.set("test", Record::new("2").with("Name", "Bob").with("Value", 2.5))
            })
            .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let tx = db.begin_read();
        let alice = tx.get("test", "1").unwrap();
        assert_eq!(alice.field("Name"), Some(Value::from("Alice")));
        assert_eq!(alice.field("Value"), Some(Value::Integer(30)));
        assert_eq!(
            tx.get("test", "2").unwrap().field("Value"),
            Some(Value::Float(2.5))
        );
    }

    #[test]
    fn file_is_pretty_json_by_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");

        let db = Database::open(&path).unwrap();
        db.transaction(|tx| tx.set("test", Record::new("1").with("Name", "Alice")))
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"test\""));
        assert!(text.contains("\"Name\": \"Alice\""));
    }

    #[test]
    fn malformed_file_fails_to_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, b"{ not json").unwrap();

        assert!(matches!(Database::open(&path), Err(CoreError::Codec(_))));
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let db = Database::open(&path).unwrap();
        assert!(db.entity_counts().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn concurrent_readers_and_writer() {
        let db = create_db();
        db.transaction(|tx| tx.set("test", Record::new("1").with("Value", 1)))
            .unwrap();

        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..100 {
                        let tx = db.begin_read();
                        let value = tx.get("test", "1").unwrap().field("Value");
                        assert!(matches!(value, Some(Value::Integer(_))));
                    }
                });
            }
            s.spawn(|| {
                for n in 2..50 {
                    db.transaction(|tx| tx.set("test", Record::new("1").with("Value", n)))
                        .unwrap();
                }
            });
        });

        let tx = db.begin_read();
        assert_eq!(
            tx.get("test", "1").unwrap().field("Value"),
            Some(Value::Integer(49))
        );
    }

    #[test]
    fn debug_lists_components() {
        let db = create_db();
        db.add_index("test", "Name");

        let debug = format!("{db:?}");
        assert!(debug.contains("memory"));
        assert!(debug.contains("Name"));
    }
}
