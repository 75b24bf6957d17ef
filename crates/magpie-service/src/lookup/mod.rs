//! Cache lookup with degrade-to-miss semantics.
//!
//! A restore must never break the build, so every lookup failure — a 5xx, a
//! malformed body, a dead network — is logged and reported as a plain miss.
//! Downstream, a miss just means "rebuild from scratch".

use tracing::warn;

use crate::client::CacheServiceClient;

/// Outcome of a cache query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// An entry exists; the archive can be fetched from `location`
    Hit { location: String },
    Miss,
}

impl Lookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit { .. })
    }
}

/// Query the service for an entry matching {key, version}.
///
/// A 204 is the definitional miss. A success body counts as a hit only when
/// its `archiveLocation` is present and non-empty.
pub async fn query(client: &CacheServiceClient, key: &str, version: &str) -> Lookup {
    match client.get_cache_entry(key, version).await {
        Ok(Some(entry)) => match entry.archive_location {
            Some(location) if !location.is_empty() => Lookup::Hit { location },
            _ => Lookup::Miss,
        },
        Ok(None) => Lookup::Miss,
        Err(error) => {
            warn!("Cache query failed, treating as miss: {}", error);
            Lookup::Miss
        },
    }
}
