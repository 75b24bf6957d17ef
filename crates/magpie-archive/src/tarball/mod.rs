//! In-process tar+gzip codec.
//!
//! A pure-Rust counterpart to the subprocess pipeline: no external tools,
//! deterministic, and therefore also the archiver the test suites use.

pub mod create;
pub mod extract;

use std::path::Path;

use async_trait::async_trait;

use magpie_core::error::MagpieError;

use crate::archiver::Archiver;
use crate::ArchiveResult;

pub use create::create_tarball;
pub use extract::extract_tarball;

/// Archiver backed by the in-process tar+gzip codec
#[derive(Debug, Clone, Default)]
pub struct GzipArchiver;

#[async_trait]
impl Archiver for GzipArchiver {
    fn compression_id(&self) -> &str {
        "gzip"
    }

    async fn create(
        &self,
        source_dir: &Path,
        subdir: &str,
        archive_path: &Path,
    ) -> ArchiveResult<u64> {
        let file = std::fs::File::create(archive_path).map_err(|e| {
            MagpieError::io(
                format!("Failed to create archive: {}", archive_path.display()),
                e,
            )
        })?;

        create::create_tarball(file, source_dir, subdir)?;

        let metadata = std::fs::metadata(archive_path).map_err(|e| {
            MagpieError::io(
                format!("Failed to stat archive: {}", archive_path.display()),
                e,
            )
        })?;
        Ok(metadata.len())
    }

    async fn extract(&self, archive_path: &Path, dest_dir: &Path) -> ArchiveResult<()> {
        let file = std::fs::File::open(archive_path).map_err(|e| {
            MagpieError::io(
                format!("Failed to open archive: {}", archive_path.display()),
                e,
            )
        })?;

        extract::extract_tarball(file, dest_dir)
    }
}
