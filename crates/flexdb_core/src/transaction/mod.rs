//! Transactions over the entity store.
//!
//! A transaction stages writes in a private overlay. Reads see the overlay
//! first and fall back to committed state, so each transaction reads its own
//! writes; there is no snapshot isolation against concurrent commits.
//! Nothing a transaction stages is visible to others until commit.

mod overlay;
mod state;

pub use overlay::{Overlay, PendingWrite};
pub use state::{Transaction, TransactionState};
