//! Cache version fingerprinting.
//!
//! A cache entry is addressed by {key, version}. The version distinguishes
//! incompatible archive encodings of the same key, so it folds in the cached
//! path, the OS family, and the compression algorithm. The scheme must stay
//! byte-stable across releases or every historical entry turns into a miss.

use sha2::{Digest, Sha256};

/// Compute the version fingerprint for a cache entry.
///
/// Joins the cached path, OS id, and compression id with a newline, hashes
/// with SHA-256, and renders as lowercase hex. Pure and deterministic.
pub fn compute_version(cache_path: &str, os_id: &str, compression_id: &str) -> String {
    let joined = [cache_path, os_id, compression_id].join("\n");
    hex::encode(Sha256::digest(joined.as_bytes()))
}
