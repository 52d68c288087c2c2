//! # FlexDB Testkit
//!
//! Test utilities for FlexDB.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - A typed sample entity
//! - Property-based test generators using proptest
//! - A snapshot backend whose writes can be made to fail
//!
//! ## Usage
//!
//! ```rust
//! use flexdb_testkit::prelude::*;
//!
//! with_temp_db(|db| {
//!     seed_people(db).unwrap();
//!     assert_eq!(db.entity_counts().get(TEST_TYPE), Some(&3));
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faulty;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faulty::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use faulty::*;
pub use fixtures::*;
pub use generators::*;
