//! Whole-database snapshot encoding.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use std::collections::BTreeMap;

/// Named fields of one record.
pub type FieldMap = BTreeMap<String, Value>;

/// Entity type → record id → fields.
pub type Snapshot = BTreeMap<String, BTreeMap<String, FieldMap>>;

/// Encodes a snapshot as JSON.
///
/// With `pretty` set the output is indented with two spaces.
pub fn encode_snapshot(snapshot: &Snapshot, pretty: bool) -> CodecResult<Vec<u8>> {
    let result = if pretty {
        serde_json::to_vec_pretty(snapshot)
    } else {
        serde_json::to_vec(snapshot)
    };
    result.map_err(CodecError::EncodingFailed)
}

/// Decodes a snapshot from JSON bytes.
///
/// Fails unless the input is an object of objects of objects.
pub fn decode_snapshot(bytes: &[u8]) -> CodecResult<Snapshot> {
    serde_json::from_slice(bytes).map_err(CodecError::decoding)
}
