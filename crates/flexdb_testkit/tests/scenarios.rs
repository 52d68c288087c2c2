//! End-to-end scenarios across the store, transactions, queries, hooks and
//! migrations.

use flexdb_core::{CoreError, Database, EntityRef, HookEvent, TransactionState, Value};
use flexdb_testkit::prelude::*;
use std::sync::mpsc;
use std::thread;

fn sorted_ids(records: &[EntityRef]) -> Vec<String> {
    let mut ids: Vec<_> = records.iter().map(|r| r.id().to_string()).collect();
    ids.sort();
    ids
}

#[test]
fn set_then_get_in_new_transaction() {
    with_temp_db(|db| {
        let mut tx = db.begin_write();
        tx.set(TEST_TYPE, TestEntity::new("1", "Alice", 30)).unwrap();
        tx.commit().unwrap();

        let tx = db.begin_read();
        let alice = tx.get(TEST_TYPE, "1").unwrap();
        assert_eq!(
            TestEntity::from_entity(alice.as_ref()),
            Some(TestEntity::new("1", "Alice", 30))
        );
    });
}

#[test]
fn where_eq_finds_bob() {
    with_temp_db(|db| {
        seed_people(db).unwrap();
        let tx = db.begin_read();

        let found = tx.query(TEST_TYPE).where_eq("Value", 25).execute().unwrap();
        assert_eq!(sorted_ids(&found), vec!["2"]);

        db.add_index(TEST_TYPE, "Value");
        let found = tx.query(TEST_TYPE).where_eq("Value", 25).execute().unwrap();
        assert_eq!(sorted_ids(&found), vec!["2"]);
    });
}

#[test]
fn where_like_finds_alice_and_charlie() {
    with_temp_db(|db| {
        seed_people(db).unwrap();
        let tx = db.begin_read();

        let found = tx.query(TEST_TYPE).where_like("Name", "li").execute().unwrap();
        assert_eq!(sorted_ids(&found), vec!["1", "3"]);
    });
}

#[test]
fn batch_delete_leaves_only_bob() {
    with_temp_db(|db| {
        seed_people(db).unwrap();

        let mut tx = db.begin_write();
        tx.batch_delete(TEST_TYPE, ["1", "3"]).unwrap();
        tx.commit().unwrap();

        let tx = db.begin_read();
        assert_eq!(sorted_ids(&tx.get_all(TEST_TYPE)), vec!["2"]);
    });
}

#[test]
fn uncommitted_change_is_invisible_to_concurrent_reader() {
    with_temp_db(|db| {
        seed_people(db).unwrap();
        let (staged_tx, staged_rx) = mpsc::channel();
        let (committed_tx, committed_rx) = mpsc::channel();

        thread::scope(|s| {
            s.spawn(move || {
                let mut tx = db.begin_write();
                tx.set(TEST_TYPE, TestEntity::new("1", "Alice", 99)).unwrap();
                staged_tx.send(()).unwrap();

                // Wait for the reader to look before committing.
                committed_rx.recv().unwrap();
                tx.commit().unwrap();
                staged_tx.send(()).unwrap();
            });

            staged_rx.recv().unwrap();
            let reader = db.begin_read();
            let value = reader.get(TEST_TYPE, "1").unwrap().field("Value");
            assert_eq!(value, Some(Value::Integer(30)));
            committed_tx.send(()).unwrap();

            staged_rx.recv().unwrap();
            let value = db.begin_read().get(TEST_TYPE, "1").unwrap().field("Value");
            assert_eq!(value, Some(Value::Integer(99)));
        });
    });
}

#[test]
fn failed_persistence_keeps_everything_unchanged() {
    let (db, backend) = TestDatabase::faulty();
    seed_people(&db).unwrap();
    db.add_index(TEST_TYPE, "Value");
    let before = db.snapshot();
    let bytes_before = backend.data();

    // Warm the cache so a stale entry would show.
    assert!(db.begin_read().get(TEST_TYPE, "2").is_some());

    let mut tx = db.begin_write();
    tx.set(TEST_TYPE, TestEntity::new("2", "Bob", 40)).unwrap();
    tx.delete(TEST_TYPE, "1").unwrap();

    backend.fail_writes(true);
    let err = tx.commit().unwrap_err();

    assert!(matches!(err, CoreError::PersistenceFailed { .. }));
    assert_eq!(tx.state(), TransactionState::Active);
    assert_eq!(tx.pending_count(), 2);
    assert_eq!(db.snapshot(), before);
    assert_eq!(backend.data(), bytes_before);
    assert_eq!(
        db.begin_read().get(TEST_TYPE, "2").unwrap().field("Value"),
        Some(Value::Integer(25))
    );
    assert_eq!(
        db.store().lookup_index(TEST_TYPE, "Value", &Value::Integer(25)),
        Some(vec!["2".to_string()])
    );
    assert_eq!(db.stats().commit_failures, 1);

    // The same transaction can be retried once the backend recovers.
    backend.fail_writes(false);
    tx.commit().unwrap();
    assert_eq!(
        db.begin_read().get(TEST_TYPE, "2").unwrap().field("Value"),
        Some(Value::Integer(40))
    );
    assert!(db.begin_read().get(TEST_TYPE, "1").is_none());
}

#[test]
fn second_commit_is_already_committed() {
    with_temp_db(|db| {
        let mut tx = db.begin_write();
        tx.set(TEST_TYPE, TestEntity::new("1", "Alice", 30)).unwrap();
        tx.commit().unwrap();

        assert!(matches!(tx.commit(), Err(CoreError::AlreadyCommitted)));
    });
}

#[test]
fn records_survive_reopen() {
    let db = TestDatabase::file();
    seed_people(&db).unwrap();
    let mut tx = db.begin_write();
    tx.delete(TEST_TYPE, "3").unwrap();
    tx.commit().unwrap();
    drop(tx);

    let db = db.reopen();
    let tx = db.begin_read();
    let people: Vec<_> = tx
        .query(TEST_TYPE)
        .order_by("Value", false)
        .execute()
        .unwrap()
        .iter()
        .filter_map(|r| TestEntity::from_entity(r.as_ref()))
        .collect();

    assert_eq!(
        people,
        vec![TestEntity::new("2", "Bob", 25), TestEntity::new("1", "Alice", 30)]
    );
}

#[test]
fn malformed_file_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, br#"{"test": ["not", "an", "object"]}"#).unwrap();

    assert!(matches!(Database::open(&path), Err(CoreError::Codec(_))));
}

#[test]
fn rollback_discards_staged_writes() {
    with_temp_db(|db| {
        seed_people(db).unwrap();
        let before = db.snapshot();

        let mut tx = db.begin_write();
        tx.set(TEST_TYPE, TestEntity::new("4", "Dana", 1)).unwrap();
        tx.delete(TEST_TYPE, "1").unwrap();
        tx.rollback();

        assert_eq!(tx.state(), TransactionState::RolledBack);
        assert_eq!(db.snapshot(), before);
    });
}

#[test]
fn validation_hook_rejects_empty_names() {
    with_temp_db(|db| {
        db.register_hook(HookEvent::PreSet, |_tx, ty, record| {
            let empty = record
                .field("Name")
                .and_then(|v| v.as_text().map(str::is_empty))
                .unwrap_or(true);
            if ty == TEST_TYPE && empty {
                return Err(CoreError::hook_rejected(HookEvent::PreSet, "Name is required"));
            }
            Ok(())
        });

        let mut tx = db.begin_write();
        let err = tx.set(TEST_TYPE, TestEntity::new("1", "", 1)).unwrap_err();
        assert_eq!(err.to_string(), "pre-set hook rejected operation: Name is required");

        tx.set(TEST_TYPE, TestEntity::new("2", "Bob", 25)).unwrap();
        tx.commit().unwrap();
        assert_eq!(db.entity_counts().get(TEST_TYPE), Some(&1));
    });
}

#[test]
fn migrations_apply_once() {
    with_temp_db(|db| {
        seed_people(db).unwrap();
        db.add_migration(
            1,
            |tx| {
                for record in tx.get_all(TEST_TYPE) {
                    let Some(mut person) = TestEntity::from_entity(record.as_ref()) else {
                        continue;
                    };
                    person.value += 1;
                    tx.set(TEST_TYPE, person)?;
                }
                Ok(())
            },
            |_tx| Ok(()),
        );

        let first = db.migrate(1).unwrap();
        let second = db.migrate(1).unwrap();

        assert_eq!(first.applied, vec![1]);
        assert!(second.is_noop());
        let bob = db.begin_read().get(TEST_TYPE, "2").unwrap();
        assert_eq!(bob.field("Value"), Some(Value::Integer(26)));
        assert_eq!(db.migration_version().unwrap(), 1);
    });
}

#[test]
fn migration_marker_persists() {
    let db = TestDatabase::file();
    db.add_migration(3, |_tx| Ok(()), |_tx| Ok(()));
    db.migrate(3).unwrap();

    let db = db.reopen();
    assert_eq!(db.migration_version().unwrap(), 3);
    assert!(db.pending_migrations(3).unwrap().is_empty());
}

#[test]
fn counters_track_activity() {
    with_temp_db(|db| {
        seed_people(db).unwrap();
        db.add_index(TEST_TYPE, "Name");

        let tx = db.begin_read();
        tx.get(TEST_TYPE, "1").unwrap();
        tx.get(TEST_TYPE, "1").unwrap();
        tx.query(TEST_TYPE).where_eq("Name", "Bob").execute().unwrap();

        let stats = db.stats();
        assert_eq!(stats.transactions_committed, 1);
        assert_eq!(stats.writes, 3);
        assert_eq!(stats.cache_hits, 2);
        assert_eq!(stats.index_lookups, 1);
    });
}
