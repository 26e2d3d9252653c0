//! Text normalization and content hashing.

use sha2::{Digest, Sha256};

/// Collapse every whitespace run into a single space and trim both ends.
pub fn normalize_content(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compute a deterministic SHA-256 hash for the normalized text, hex encoded.
pub fn compute_content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}
