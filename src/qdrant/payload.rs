//! Helpers for constructing content-hash points.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

/// Derive a stable point identifier for a content hash.
///
/// Qdrant only accepts UUIDs or integers as ids, so the first 16 bytes of a SHA-256 over the
/// hash string become a UUID. The same hash always maps to the same point.
pub fn point_id_for_hash(content_hash: &str) -> String {
    let digest = Sha256::digest(content_hash.as_bytes());
    let mut bytes = [0_u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes).to_string()
}

/// Build the payload object stored alongside each recorded hash.
pub(crate) fn build_hash_payload(content_hash: &str, timestamp_rfc3339: &str) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert(
        "content_hash".into(),
        Value::String(content_hash.to_string()),
    );
    payload.insert(
        "first_seen".into(),
        Value::String(timestamp_rfc3339.to_string()),
    );
    payload
}

/// Current timestamp formatted for payload storage.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
