//! Tarball creation.
//!
//! Packages one designated subdirectory of a source directory, with entry
//! paths relative to the source directory so extraction into the same place
//! restores the original layout.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::Path;
use tar::Builder;
use walkdir::WalkDir;

use magpie_core::error::MagpieError;

use crate::ArchiveResult;

/// Create a gzipped tarball of `subdir` within `source_dir`
pub fn create_tarball<W: Write>(writer: W, source_dir: &Path, subdir: &str) -> ArchiveResult<()> {
    let root = source_dir.join(subdir);
    if !root.is_dir() {
        return Err(MagpieError::io(
            format!("Archive source not found: {}", root.display()),
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory"),
        ));
    }

    let gz_encoder = GzEncoder::new(writer, Compression::default());
    let mut tar_builder = Builder::new(gz_encoder);

    for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        // Entries are named relative to the source dir, so they keep the
        // `<subdir>/` prefix the way `tar -C <source> -cf <archive> <subdir>`
        // names them.
        let relative_path = path.strip_prefix(source_dir).map_err(|e| {
            MagpieError::io(
                format!("Failed to strip prefix: {}", e),
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            )
        })?;

        if entry.file_type().is_file() {
            tar_builder
                .append_path_with_name(path, relative_path)
                .map_err(|e| MagpieError::io("Failed to append archive entry".to_string(), e))?;
        } else if entry.file_type().is_dir() {
            tar_builder
                .append_dir(relative_path, path)
                .map_err(|e| MagpieError::io("Failed to append archive entry".to_string(), e))?;
        }
        // Symlinks and other special files are skipped
    }

    // Finish the tar stream, then the gzip stream
    tar_builder
        .into_inner()
        .map_err(|e| MagpieError::io("Failed to finish archive".to_string(), e))?
        .finish()
        .map_err(|e| MagpieError::io("Failed to finish compression".to_string(), e))?;

    Ok(())
}
