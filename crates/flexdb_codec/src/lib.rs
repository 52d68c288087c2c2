//! # FlexDB Codec
//!
//! Field values and the JSON snapshot format for FlexDB.
//!
//! A snapshot is a JSON object mapping entity-type name to an object
//! mapping record id to an object of named fields:
//!
//! ```json
//! {
//!   "task": {
//!     "1": { "title": "write docs", "done": false }
//!   }
//! }
//! ```
//!
//! Snapshots use ordered maps throughout, so encoding the same state
//! always produces the same bytes.
//!
//! ## Usage
//!
//! ```
//! use flexdb_codec::{decode_snapshot, encode_snapshot, Snapshot, Value};
//!
//! let mut snapshot = Snapshot::new();
//! snapshot
//!     .entry("task".to_string())
//!     .or_default()
//!     .entry("1".to_string())
//!     .or_default()
//!     .insert("done".to_string(), Value::Bool(false));
//!
//! let bytes = encode_snapshot(&snapshot, true).unwrap();
//! let decoded = decode_snapshot(&bytes).unwrap();
//! assert_eq!(snapshot, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod snapshot;
mod value;

pub use error::{CodecError, CodecResult};
pub use snapshot::{decode_snapshot, encode_snapshot, FieldMap, Snapshot};
pub use value::Value;
