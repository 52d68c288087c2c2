//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases
//! and common test scenarios.

use crate::faulty::FaultyBackend;
use flexdb_codec::{FieldMap, Value};
use flexdb_core::{Config, CoreResult, Database, Entity, Record};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Entity type used by the sample data.
pub const TEST_TYPE: &str = "test";

/// A typed sample record with `Name` and `Value` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestEntity {
    /// Record id.
    pub id: String,
    /// `Name` field.
    pub name: String,
    /// `Value` field.
    pub value: i64,
}

impl TestEntity {
    /// Creates a test entity.
    pub fn new(id: impl Into<String>, name: impl Into<String>, value: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value,
        }
    }

    /// Reads a test entity back from any stored record.
    ///
    /// Works both for `TestEntity` values written in this session and for
    /// generic records loaded from disk.
    pub fn from_entity(entity: &dyn Entity) -> Option<Self> {
        if let Some(typed) = entity.downcast_ref::<TestEntity>() {
            return Some(typed.clone());
        }
        Some(Self {
            id: entity.id().to_string(),
            name: entity.field("Name")?.as_text()?.to_string(),
            value: entity.field("Value")?.as_integer()?,
        })
    }
}

impl Entity for TestEntity {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "Name" => Some(Value::from(self.name.as_str())),
            "Value" => Some(Value::Integer(self.value)),
            _ => None,
        }
    }

    fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("Name".to_string(), Value::from(self.name.as_str()));
        fields.insert("Value".to_string(), Value::Integer(self.value));
        fields
    }
}

/// Alice (30), Bob (25) and Charlie (35) with ids 1 to 3.
pub fn sample_people() -> Vec<TestEntity> {
    vec![
        TestEntity::new("1", "Alice", 30),
        TestEntity::new("2", "Bob", 25),
        TestEntity::new("3", "Charlie", 35),
    ]
}

/// Commits [`sample_people`] under [`TEST_TYPE`].
pub fn seed_people(db: &Database) -> CoreResult<()> {
    db.transaction(|tx| tx.batch_set(TEST_TYPE, sample_people()))
}

/// A generic record with `Name` and `Value` fields.
pub fn person(id: &str, name: &str, value: i64) -> Record {
    Record::new(id).with("Name", name).with("Value", value)
}

/// A test database with automatic cleanup.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestDatabase {
    /// Creates a new in-memory test database.
    pub fn memory() -> Self {
        Self {
            db: Database::open_in_memory().expect("Failed to open in-memory database"),
            temp_dir: None,
        }
    }

    /// Creates a new file-based test database.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open(Self::file_path(temp_dir.path()))
            .expect("Failed to open file database");

        Self {
            db,
            temp_dir: Some(temp_dir),
        }
    }

    /// Creates a database on a [`FaultyBackend`], returning the backend
    /// handle used to inject failures.
    pub fn faulty() -> (Self, FaultyBackend) {
        let backend = FaultyBackend::new();
        let db = Database::open_with_backend(Config::default(), backend.clone())
            .expect("Failed to open faulty database");

        (
            Self {
                db,
                temp_dir: None,
            },
            backend,
        )
    }

    /// Returns the database path if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| Self::file_path(d.path()))
    }

    /// Closes and reopens a file-based database from disk.
    ///
    /// # Panics
    ///
    /// Panics for in-memory databases.
    #[must_use]
    pub fn reopen(self) -> Self {
        let temp_dir = self.temp_dir.expect("Only file databases can be reopened");
        drop(self.db);
        let db = Database::open(Self::file_path(temp_dir.path()))
            .expect("Failed to reopen file database");

        Self {
            db,
            temp_dir: Some(temp_dir),
        }
    }

    fn file_path(dir: &Path) -> PathBuf {
        dir.join("test.flexdb.json")
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a temporary in-memory database.
///
/// # Example
///
/// ```rust
/// use flexdb_testkit::with_temp_db;
///
/// with_temp_db(|db| {
///     assert!(db.entity_counts().is_empty());
/// });
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::memory();
    f(&test_db.db)
}

/// Runs a test with a temporary file-based database.
pub fn with_file_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database, &Path) -> R,
{
    let test_db = TestDatabase::file();
    let path = test_db.path().expect("File database should have a path");
    f(&test_db.db, &path)
}
