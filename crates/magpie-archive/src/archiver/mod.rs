//! The archiver seam.

use std::path::Path;

use async_trait::async_trait;

use crate::ArchiveResult;

/// Packages and unpacks a single build subdirectory.
///
/// The restore and save flows only ever archive one designated subdirectory
/// of the target path, so both operations take the parent directory plus the
/// subdirectory name; the archive carries entry paths relative to the
/// parent (`<subdir>/...`), which makes extraction into the target path land
/// the contents back in place.
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Identifier folded into the cache version fingerprint.
    ///
    /// Two archivers with different ids never share cache entries.
    fn compression_id(&self) -> &str;

    /// Package `subdir` of `source_dir` into `archive_path`.
    ///
    /// Returns the archive size in bytes.
    async fn create(
        &self,
        source_dir: &Path,
        subdir: &str,
        archive_path: &Path,
    ) -> ArchiveResult<u64>;

    /// Unpack `archive_path` into `dest_dir`.
    async fn extract(&self, archive_path: &Path, dest_dir: &Path) -> ArchiveResult<()>;
}
