//! Lifecycle hooks around set and delete.
//!
//! Hooks are registered per [`HookEvent`] on a database and shared by all
//! of its transactions. Each event keeps its hooks in registration order.
//! A chain is copied out of the registry before it runs, so a hook may
//! register further hooks; those take effect from the next operation.

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use crate::transaction::Transaction;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A lifecycle hook.
///
/// Receives the running transaction, the entity type and the record. For
/// delete events the record is the value being deleted. Returning an error
/// aborts the operation for pre-events; the error reaches the caller as is.
pub type Hook = Arc<dyn Fn(&mut Transaction<'_>, &str, &dyn Entity) -> CoreResult<()> + Send + Sync>;

/// Boxes a closure as a [`Hook`].
pub(crate) fn into_hook<F>(f: F) -> Hook
where
    F: Fn(&mut Transaction<'_>, &str, &dyn Entity) -> CoreResult<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The point in a record's lifecycle where a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// Before a record is staged for upsert.
    PreSet,
    /// After a record is staged for upsert.
    PostSet,
    /// Before an existing record is staged for deletion.
    PreDelete,
    /// After an existing record is staged for deletion.
    PostDelete,
}

impl HookEvent {
    /// Every event, in lifecycle order.
    pub const ALL: [HookEvent; 4] = [
        HookEvent::PreSet,
        HookEvent::PostSet,
        HookEvent::PreDelete,
        HookEvent::PostDelete,
    ];

    /// Canonical name, e.g. `"pre-set"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            HookEvent::PreSet => "pre-set",
            HookEvent::PostSet => "post-set",
            HookEvent::PreDelete => "pre-delete",
            HookEvent::PostDelete => "post-delete",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookEvent {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookEvent::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| CoreError::invalid_operation(format!("unknown hook event `{s}`")))
    }
}

/// Hook chains of one database.
#[derive(Default)]
pub struct HookRegistry {
    chains: RwLock<HashMap<HookEvent, Vec<Hook>>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook to an event's chain.
    pub fn register(&self, event: HookEvent, hook: Hook) {
        self.chains.write().entry(event).or_default().push(hook);
    }

    /// A copy of an event's chain, in registration order.
    #[must_use]
    pub fn chain(&self, event: HookEvent) -> Vec<Hook> {
        self.chains.read().get(&event).cloned().unwrap_or_default()
    }

    /// Number of hooks registered for an event.
    #[must_use]
    pub fn len(&self, event: HookEvent) -> usize {
        self.chains.read().get(&event).map_or(0, Vec::len)
    }

    /// Returns true if no hooks are registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.read().values().all(Vec::is_empty)
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chains = self.chains.read();
        let mut map = f.debug_map();
        for event in HookEvent::ALL {
            map.entry(&event.as_str(), &chains.get(&event).map_or(0, Vec::len));
        }
        map.finish()
    }
}
