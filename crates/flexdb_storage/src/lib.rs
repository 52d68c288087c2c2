//! # FlexDB Storage
//!
//! Snapshot storage backends for FlexDB.
//!
//! A backend persists one opaque byte blob: the encoded snapshot of the
//! whole database. Backends do not interpret the bytes; the codec crate owns
//! the format.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral databases
//! - [`FileBackend`] - Single-file persistence with atomic replace
//!
//! ## Example
//!
//! ```rust
//! use flexdb_storage::{InMemoryBackend, SnapshotBackend};
//!
//! let backend = InMemoryBackend::new();
//! assert!(backend.load().unwrap().is_none());
//! backend.store(b"{}").unwrap();
//! assert_eq!(backend.load().unwrap().as_deref(), Some(&b"{}"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::SnapshotBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
