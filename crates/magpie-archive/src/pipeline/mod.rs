//! Subprocess tar pipeline.
//!
//! Drives the system `tar` with an external streaming compressor, the same
//! invocation shape the hosted cache tooling uses:
//! `tar -C <dir> --use-compress-program <prog> -cf <archive> <subdir>`.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use magpie_core::error::MagpieError;

use crate::archiver::Archiver;
use crate::ArchiveResult;

/// Archiver that spawns `tar` with an external streaming compressor
#[derive(Debug, Clone)]
pub struct ZstdPipeline {
    compressor: String,
}

impl ZstdPipeline {
    pub fn new() -> Self {
        Self {
            compressor: "zstd".to_string(),
        }
    }

    /// Substitute the compressor program (tests use `gzip`)
    pub fn with_compressor(compressor: impl Into<String>) -> Self {
        Self {
            compressor: compressor.into(),
        }
    }

    async fn run_tar(&self, args: &[&str]) -> ArchiveResult<()> {
        // output() drains stderr to completion before the exit status is
        // inspected; a chatty compressor cannot deadlock on a full pipe.
        let output = Command::new("tar")
            .args(args)
            .output()
            .await
            .map_err(|e| MagpieError::io("Failed to spawn tar".to_string(), e))?;

        if output.status.success() {
            return Ok(());
        }

        Err(MagpieError::Archive {
            command: format!("tar {}", args.join(" ")),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

impl Default for ZstdPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Archiver for ZstdPipeline {
    fn compression_id(&self) -> &str {
        &self.compressor
    }

    async fn create(
        &self,
        source_dir: &Path,
        subdir: &str,
        archive_path: &Path,
    ) -> ArchiveResult<u64> {
        let source = source_dir.to_string_lossy().into_owned();
        let archive = archive_path.to_string_lossy().into_owned();

        self.run_tar(&[
            "-C",
            &source,
            "--use-compress-program",
            &self.compressor,
            "-cf",
            &archive,
            subdir,
        ])
        .await?;

        let metadata = tokio::fs::metadata(archive_path).await.map_err(|e| {
            MagpieError::io(
                format!("Failed to stat archive: {}", archive_path.display()),
                e,
            )
        })?;
        Ok(metadata.len())
    }

    async fn extract(&self, archive_path: &Path, dest_dir: &Path) -> ArchiveResult<()> {
        let dest = dest_dir.to_string_lossy().into_owned();
        let archive = archive_path.to_string_lossy().into_owned();

        self.run_tar(&[
            "-C",
            &dest,
            "--use-compress-program",
            &self.compressor,
            "-xf",
            &archive,
        ])
        .await
    }
}
