//! Cache service wire types.
//!
//! Fields are camelCase on the wire; reads also accept the PascalCase
//! spellings some service implementations emit.

use serde::{Deserialize, Serialize};

/// Entry returned by a successful cache query
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheEntry {
    /// Opaque retrieval URL for the archive; absent or empty means miss
    #[serde(default, rename = "archiveLocation", alias = "ArchiveLocation")]
    pub archive_location: Option<String>,
    /// Key the entry was stored under
    #[serde(default, rename = "cacheKey", alias = "CacheKey")]
    pub cache_key: Option<String>,
}

/// Body of a reserve call, announcing the upcoming upload size
#[derive(Debug, Clone, Serialize)]
pub struct ReserveCacheRequest {
    pub key: String,
    pub version: String,
    #[serde(rename = "cacheSize")]
    pub cache_size: u64,
}

/// Reserve response carrying the id the upload and commit address
#[derive(Debug, Clone, Deserialize)]
pub struct ReserveCacheResponse {
    #[serde(default, rename = "cacheId", alias = "CacheId")]
    pub cache_id: Option<i64>,
}

/// Body of the commit call finalizing an upload
#[derive(Debug, Clone, Serialize)]
pub struct CommitCacheRequest {
    pub size: u64,
}
