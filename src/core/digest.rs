// src/core/digest.rs
//! Content digests used for change detection

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// First `len` hex chars of the digest; used to derive stable job ids.
pub fn short_digest(data: &[u8], len: usize) -> String {
    let mut full = sha256_hex(data);
    full.truncate(len);
    full
}
