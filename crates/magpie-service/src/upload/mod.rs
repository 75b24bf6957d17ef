//! Chunked archive upload.
//!
//! A save is a three-step protocol: reserve an entry, PATCH the archive up
//! in fixed-size chunks, commit the final size. Chunks go up strictly in
//! order, one at a time — memory stays bounded to a single chunk buffer and
//! a failed chunk aborts the save before anything is committed.

use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use magpie_core::error::MagpieError;

use crate::client::CacheServiceClient;
use crate::ServiceResult;

/// Bounded iterator of end-inclusive `(start, end)` byte ranges covering a
/// file: strictly increasing, contiguous, and summing to the file size.
#[derive(Debug, Clone)]
pub struct ChunkRanges {
    file_size: u64,
    chunk_size: u64,
    offset: u64,
}

impl ChunkRanges {
    pub fn new(file_size: u64, chunk_size: usize) -> Self {
        Self {
            file_size,
            chunk_size: chunk_size.max(1) as u64,
            offset: 0,
        }
    }
}

impl Iterator for ChunkRanges {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<(u64, u64)> {
        if self.offset >= self.file_size {
            return None;
        }
        let start = self.offset;
        let end = (start + self.chunk_size).min(self.file_size) - 1;
        self.offset = end + 1;
        Some((start, end))
    }
}

/// Upload the archive at `archive_path` under {key, version}.
///
/// Reserve and upload failures abort the save. A commit failure is logged
/// and swallowed: the reservation is left unfinished on the service side,
/// and the caller's local cleanup still runs.
pub async fn save_cache(
    client: &CacheServiceClient,
    key: &str,
    version: &str,
    archive_path: &Path,
    chunk_size: usize,
) -> ServiceResult<()> {
    let file_size = tokio::fs::metadata(archive_path)
        .await
        .map_err(|e| {
            MagpieError::io(
                format!("Failed to stat archive: {}", archive_path.display()),
                e,
            )
        })?
        .len();

    let cache_id = client.reserve_cache(key, version, file_size).await?;
    info!("Reserved cache id {} for {} bytes", cache_id, file_size);

    let mut file = File::open(archive_path).await.map_err(|e| {
        MagpieError::io(
            format!("Failed to open archive: {}", archive_path.display()),
            e,
        )
    })?;

    for (start, end) in ChunkRanges::new(file_size, chunk_size) {
        let mut chunk = vec![0u8; (end - start + 1) as usize];
        file.read_exact(&mut chunk)
            .await
            .map_err(|e| MagpieError::io("Failed to read archive chunk".to_string(), e))?;
        client.upload_chunk(cache_id, start, chunk).await?;
    }

    if let Err(error) = client.commit_cache(cache_id, file_size).await {
        warn!("Cache commit failed: {}", error);
    }

    Ok(())
}
