//! Transaction state and the commit protocol.

use crate::database::Database;
use crate::entity::{Entity, EntityRef};
use crate::error::{CoreError, CoreResult};
use crate::hooks::HookEvent;
use crate::query::Query;
use crate::transaction::{Overlay, PendingWrite};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    RolledBack,
}

/// A read-only or read-write session on a [`Database`].
///
/// Dropping an active transaction rolls it back.
pub struct Transaction<'db> {
    db: &'db Database,
    read_only: bool,
    state: TransactionState,
    overlay: Overlay,
}

impl<'db> Transaction<'db> {
    pub(crate) fn new(db: &'db Database, read_only: bool) -> Self {
        Self {
            db,
            read_only,
            state: TransactionState::Active,
            overlay: Overlay::new(),
        }
    }

    /// The database this transaction runs against.
    #[must_use]
    pub fn database(&self) -> &'db Database {
        self.db
    }

    /// Returns true for a read-only transaction.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Number of staged writes.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.overlay.len()
    }

    /// Reads a record, preferring this transaction's staged changes.
    ///
    /// A staged delete hides the record whatever the store holds.
    pub fn get(&self, entity_type: &str, id: &str) -> Option<EntityRef> {
        match self.overlay.get(entity_type, id) {
            Some(PendingWrite::Put(record)) => Some(Arc::clone(record)),
            Some(PendingWrite::Delete) => None,
            None => self.db.store().get(entity_type, id),
        }
    }

    /// Reads every record of a type as this transaction sees it. Unordered.
    pub fn get_all(&self, entity_type: &str) -> Vec<EntityRef> {
        let committed = self.db.store().get_all(entity_type);

        let mut merged: HashMap<String, EntityRef> = committed
            .into_iter()
            .map(|record| (record.id().to_string(), record))
            .collect();
        for (id, write) in self.overlay.writes_for(entity_type) {
            match write {
                PendingWrite::Put(record) => {
                    merged.insert(id.to_string(), Arc::clone(record));
                }
                PendingWrite::Delete => {
                    merged.remove(id);
                }
            }
        }
        merged.into_values().collect()
    }

    /// Starts a query over `entity_type`.
    pub fn query(&self, entity_type: &str) -> Query<'_> {
        Query::new(self, entity_type)
    }

    /// Stages an upsert of `entity` under `entity_type`.
    ///
    /// Pre-set hooks run first, in registration order; the first failure
    /// aborts the set. Post-set hooks run after staging, and a failure there
    /// is returned without undoing the staged write.
    pub fn set<E: Entity + 'static>(&mut self, entity_type: &str, entity: E) -> CoreResult<()> {
        self.set_ref(entity_type, Arc::new(entity))
    }

    /// Stages an upsert of an already shared record.
    pub fn set_ref(&mut self, entity_type: &str, entity: EntityRef) -> CoreResult<()> {
        self.ensure_writable("set")?;
        if entity.id().is_empty() {
            return Err(CoreError::invalid_operation("record id must not be empty"));
        }

        self.run_hooks(HookEvent::PreSet, entity_type, entity.as_ref())?;
        // A hook may have ended the transaction.
        self.ensure_writable("set")?;

        self.overlay.put(entity_type, Arc::clone(&entity));
        self.db.store().stats().record_write();

        self.run_hooks(HookEvent::PostSet, entity_type, entity.as_ref())
    }

    /// Stages a delete.
    ///
    /// Delete hooks run only if the record currently exists as seen by this
    /// transaction; the tombstone is staged either way.
    pub fn delete(&mut self, entity_type: &str, id: &str) -> CoreResult<()> {
        self.ensure_writable("delete")?;

        let current = self.get(entity_type, id);
        if let Some(record) = &current {
            self.run_hooks(HookEvent::PreDelete, entity_type, record.as_ref())?;
            self.ensure_writable("delete")?;
        }

        self.overlay.delete(entity_type, id);
        self.db.store().stats().record_delete();

        match current {
            Some(record) => self.run_hooks(HookEvent::PostDelete, entity_type, record.as_ref()),
            None => Ok(()),
        }
    }

    /// Sets records in order, stopping at the first failure.
    ///
    /// Records staged before the failure stay staged.
    pub fn batch_set<I, E>(&mut self, entity_type: &str, entities: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = E>,
        E: Entity + 'static,
    {
        for entity in entities {
            self.set(entity_type, entity)?;
        }
        Ok(())
    }

    /// Deletes records in order, stopping at the first failure.
    pub fn batch_delete<I, S>(&mut self, entity_type: &str, ids: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            self.delete(entity_type, id.as_ref())?;
        }
        Ok(())
    }

    /// Commits the transaction.
    ///
    /// For a read-only transaction this only marks it committed. For a write
    /// transaction the staged state is persisted first and applied in memory
    /// only once the backend has accepted it. If persisting fails the
    /// transaction stays active with its overlay intact, and the error is
    /// `PersistenceFailed`.
    ///
    /// # Errors
    ///
    /// `AlreadyCommitted` for a second commit of a write transaction,
    /// `InvalidOperation` after a rollback.
    pub fn commit(&mut self) -> CoreResult<()> {
        match self.state {
            TransactionState::Active => {}
            TransactionState::Committed if self.read_only => return Ok(()),
            TransactionState::Committed => return Err(CoreError::AlreadyCommitted),
            TransactionState::RolledBack => {
                return Err(CoreError::invalid_operation(
                    "transaction already rolled back",
                ))
            }
        }

        if self.read_only {
            self.state = TransactionState::Committed;
            return Ok(());
        }

        let store = self.db.store();
        if let Err(e) = store.commit(
            &self.overlay,
            self.db.backend(),
            self.db.config().pretty_print,
        ) {
            store.stats().record_commit_failure();
            return Err(e);
        }

        self.overlay.clear();
        self.state = TransactionState::Committed;
        store.stats().record_commit();
        Ok(())
    }

    /// Discards all staged changes. No-op once committed or rolled back.
    pub fn rollback(&mut self) {
        if self.state != TransactionState::Active {
            return;
        }
        self.overlay.clear();
        self.state = TransactionState::RolledBack;
        if !self.read_only {
            self.db.store().stats().record_rollback();
        }
    }

    fn ensure_writable(&self, operation: &'static str) -> CoreResult<()> {
        match self.state {
            TransactionState::Active => {}
            TransactionState::Committed => {
                return Err(CoreError::invalid_operation(
                    "transaction already committed",
                ))
            }
            TransactionState::RolledBack => {
                return Err(CoreError::invalid_operation(
                    "transaction already rolled back",
                ))
            }
        }
        if self.read_only {
            return Err(CoreError::ReadOnlyTransaction { operation });
        }
        Ok(())
    }

    fn run_hooks(
        &mut self,
        event: HookEvent,
        entity_type: &str,
        record: &dyn Entity,
    ) -> CoreResult<()> {
        for hook in self.db.hooks().chain(event) {
            hook(&mut *self, entity_type, record)?;
        }
        Ok(())
    }

    pub(crate) fn overlay(&self) -> &Overlay {
        &self.overlay
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.state == TransactionState::Active && !self.overlay.is_empty() {
            tracing::debug!(
                pending = self.overlay.len(),
                "dropping active transaction, discarding staged writes"
            );
        }
        self.rollback();
    }
}

impl fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("read_only", &self.read_only)
            .field("state", &self.state)
            .field("pending", &self.overlay.len())
            .finish_non_exhaustive()
    }
}
