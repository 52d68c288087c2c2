//! Secondary equality indexes.
//!
//! Indexes are internal access paths keyed by (entity type, field name).
//! They are:
//! - Built by scanning on `add_index`
//! - Maintained incrementally, under the store's exclusive lock, on every
//!   commit
//! - Held in memory only
//!
//! Query equality is defined through [`IndexKey`], so a bucket lookup and a
//! linear scan always agree on which records match.

mod hash;
mod key;
mod manager;

pub use hash::HashIndex;
pub use key::IndexKey;
pub use manager::IndexManager;
