//! HTTP client for the remote cache service.

use std::path::Path;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, StatusCode};
use tokio::io::AsyncWriteExt;

use magpie_config::ServiceConfig;
use magpie_core::error::MagpieError;

use crate::api::{CacheEntry, CommitCacheRequest, ReserveCacheRequest, ReserveCacheResponse};
use crate::ServiceResult;

/// API content-type/version string every request is pinned to
const API_ACCEPT: &str = "application/json;api-version=6.0-preview.1";

/// Authenticated HTTP client bound to one cache service
#[derive(Debug, Clone)]
pub struct CacheServiceClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Artifact-cache API root, always ending in a slash
    base_url: String,
}

impl CacheServiceClient {
    /// Create a client from connection settings
    pub fn new(config: &ServiceConfig) -> ServiceResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            format!("Bearer {}", config.token)
                .parse()
                .map_err(|e: reqwest::header::InvalidHeaderValue| MagpieError::Network {
                    message: format!("Invalid auth token: {}", e),
                    source: Some(Box::new(e)),
                })?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(API_ACCEPT));

        let client = ClientBuilder::new()
            .default_headers(headers)
            .user_agent(concat!("magpie/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MagpieError::network("Failed to create HTTP client".to_string(), e))?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/_apis/artifactcache/",
                config.base_url.trim_end_matches('/')
            ),
        })
    }

    /// Create a client from the environment, or `None` when the service
    /// connection is not configured — a normal condition, not an error.
    pub fn from_env() -> ServiceResult<Option<Self>> {
        ServiceConfig::from_env()
            .map(|config| Self::new(&config))
            .transpose()
    }

    /// Query for an existing entry matching {key, version}.
    ///
    /// `Ok(None)` is the service's definitional miss (204 No Content).
    /// Non-success statuses are errors here; the lookup layer decides how to
    /// degrade them.
    pub async fn get_cache_entry(
        &self,
        key: &str,
        version: &str,
    ) -> ServiceResult<Option<CacheEntry>> {
        let url = format!("{}cache", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("keys", key), ("version", version)])
            .send()
            .await
            .map_err(|e| MagpieError::network("Cache query failed".to_string(), e))?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(None),
            status if status.is_success() => {
                let entry = response.json::<CacheEntry>().await.map_err(|e| {
                    MagpieError::network("Failed to parse cache entry".to_string(), e)
                })?;
                Ok(Some(entry))
            },
            status => Err(MagpieError::Network {
                message: format!("Cache query returned {}", status),
                source: None,
            }),
        }
    }

    /// Reserve an entry ahead of an upload; returns the positive cache id
    pub async fn reserve_cache(
        &self,
        key: &str,
        version: &str,
        cache_size: u64,
    ) -> ServiceResult<i64> {
        let url = format!("{}caches", self.base_url);
        let body = ReserveCacheRequest {
            key: key.to_string(),
            version: version.to_string(),
            cache_size,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| MagpieError::network("Cache reservation failed".to_string(), e))?;

        if !response.status().is_success() {
            return Err(MagpieError::Reserve {
                message: read_body(response).await,
            });
        }

        let reserved = response.json::<ReserveCacheResponse>().await.map_err(|e| {
            MagpieError::network("Failed to parse reserve response".to_string(), e)
        })?;

        match reserved.cache_id {
            Some(id) if id > 0 => Ok(id),
            _ => Err(MagpieError::Reserve {
                message: "invalid reserve response".to_string(),
            }),
        }
    }

    /// Upload one chunk of the archive to a reserved entry.
    ///
    /// `offset` is the absolute position of the chunk's first byte. The
    /// Content-Range end is inclusive, and the total stays `*`: the service
    /// only learns the final size at commit time.
    pub async fn upload_chunk(
        &self,
        cache_id: i64,
        offset: u64,
        chunk: Vec<u8>,
    ) -> ServiceResult<()> {
        let url = format!("{}caches/{}", self.base_url, cache_id);
        let content_range = format!("bytes {}-{}/*", offset, offset + chunk.len() as u64 - 1);

        let response = self
            .client
            .patch(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_RANGE, content_range)
            .body(chunk)
            .send()
            .await
            .map_err(|e| MagpieError::network("Chunk upload failed".to_string(), e))?;

        if !response.status().is_success() {
            return Err(MagpieError::Upload {
                message: read_body(response).await,
            });
        }
        Ok(())
    }

    /// Finalize a reserved entry after all chunks are uploaded
    pub async fn commit_cache(&self, cache_id: i64, size: u64) -> ServiceResult<()> {
        let url = format!("{}caches/{}", self.base_url, cache_id);
        let response = self
            .client
            .post(&url)
            .json(&CommitCacheRequest { size })
            .send()
            .await
            .map_err(|e| MagpieError::network("Cache commit failed".to_string(), e))?;

        if !response.status().is_success() {
            return Err(MagpieError::Commit {
                message: read_body(response).await,
            });
        }
        Ok(())
    }
}

/// Download an archive from its retrieval URL into `dest`.
///
/// The URL is an opaque pre-signed location, so the request carries no
/// service credentials. Returns the number of bytes written.
pub async fn download_archive(url: &str, dest: &Path) -> ServiceResult<u64> {
    let mut response = reqwest::get(url)
        .await
        .map_err(|e| MagpieError::network("Archive download failed".to_string(), e))?;

    if !response.status().is_success() {
        return Err(MagpieError::Network {
            message: format!("Archive download returned {}", response.status()),
            source: None,
        });
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| MagpieError::io(format!("Failed to create {}", dest.display()), e))?;

    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| MagpieError::network("Archive download interrupted".to_string(), e))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| MagpieError::io("Failed to write archive".to_string(), e))?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| MagpieError::io("Failed to flush archive".to_string(), e))?;

    Ok(written)
}

/// Best-effort response body for error reporting
async fn read_body(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) if !body.is_empty() => body,
        _ => format!("status {}", status),
    }
}

#[cfg(test)]
mod tests;
