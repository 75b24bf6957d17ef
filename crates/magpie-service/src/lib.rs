//! Remote cache service client for magpie.
//!
//! This crate speaks the artifact-cache wire protocol: an authenticated
//! query/reserve/upload/commit surface relative to a service base URL, plus
//! unauthenticated streaming download of archive blobs from their opaque
//! retrieval URLs.

pub mod api;
pub mod client;
pub mod lookup;
pub mod upload;

// Re-export main types
pub use api::{CacheEntry, ReserveCacheResponse};
pub use client::{download_archive, CacheServiceClient};
pub use lookup::Lookup;
pub use upload::{save_cache, ChunkRanges};

use magpie_core::error::MagpieError;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, MagpieError>;
