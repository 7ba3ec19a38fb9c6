//! Hash-chain primitives for the validation history.
//!
//! Hash input layout (bytes, in order):
//!   1. sequence as 8-byte little-endian
//!   2. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   3. compact JSON of the snapshot

use sha2::{Digest, Sha256};

use crate::record::{ValidationRecord, ValidationSnapshot};

/// SHA-256 of one record's content, as lowercase hex.
///
/// # Panics
///
/// Panics if `snapshot` cannot be serialized to JSON, which cannot happen
/// for `ValidationSnapshot`.
pub fn hash_record(sequence: u64, snapshot: &ValidationSnapshot, prev_hash: &str) -> String {
    let snapshot_json =
        serde_json::to_vec(snapshot).expect("ValidationSnapshot must always serialize to JSON");

    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&snapshot_json);

    hex::encode(hasher.finalize())
}

/// Verify a contiguous window of the chain.
///
/// `anchor` is the `this_hash` of the record just before the window
/// (`GENESIS_HASH` when the window starts at the beginning). Checks that
/// every `prev_hash` links to its predecessor, that sequences are
/// consecutive, and that every `this_hash` recomputes. An empty window is
/// valid.
pub fn verify_chain(records: &[ValidationRecord], anchor: &str) -> bool {
    let mut expected_prev = anchor;
    let mut expected_sequence = records.first().map(|r| r.sequence);

    for record in records {
        if record.prev_hash != expected_prev || Some(record.sequence) != expected_sequence {
            return false;
        }
        if record.this_hash != hash_record(record.sequence, &record.snapshot, &record.prev_hash) {
            return false;
        }
        expected_prev = record.this_hash.as_str();
        expected_sequence = Some(record.sequence + 1);
    }

    true
}
