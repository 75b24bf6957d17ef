//! Tarball extraction.
//!
//! Safe extraction with path validation: entry paths and symlink targets
//! that would land outside the destination directory are rejected.

use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::Archive;

use magpie_core::error::MagpieError;

use crate::ArchiveResult;

/// Extract a gzipped tarball into `dest_dir`
pub fn extract_tarball<R: Read>(reader: R, dest_dir: &Path) -> ArchiveResult<()> {
    let gz_decoder = GzDecoder::new(reader);
    let mut archive = Archive::new(gz_decoder);

    fs::create_dir_all(dest_dir)
        .map_err(|e| MagpieError::io("Failed to create destination".to_string(), e))?;

    let entries = archive
        .entries()
        .map_err(|e| MagpieError::io("Failed to read archive".to_string(), e))?;

    for entry_result in entries {
        let mut entry =
            entry_result.map_err(|e| MagpieError::io("Failed to read archive entry".to_string(), e))?;

        let entry_path = entry
            .path()
            .map_err(|e| MagpieError::io("Failed to read entry path".to_string(), e))?
            .into_owned();
        let safe_path = validate_extract_path(&entry_path, dest_dir)?;

        let entry_type = entry.header().entry_type();
        let mode = entry.header().mode().ok();

        match entry_type {
            tar::EntryType::Regular => {
                extract_regular_file(&mut entry, &safe_path)?;
            },
            tar::EntryType::Directory => {
                fs::create_dir_all(&safe_path)
                    .map_err(|e| MagpieError::io("Failed to create directory".to_string(), e))?;
            },
            tar::EntryType::Symlink | tar::EntryType::Link => {
                extract_symlink(&mut entry, &safe_path, dest_dir)?;
            },
            _ => {
                // Char devices, block devices etc. have no business in a
                // build-output archive
                continue;
            },
        }

        if let Some(mode) = mode {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if safe_path.exists() {
                    let _ = fs::set_permissions(&safe_path, fs::Permissions::from_mode(mode));
                }
            }
        }
    }

    Ok(())
}

/// Validate an entry path, rejecting traversal out of the destination
fn validate_extract_path(entry_path: &Path, dest_dir: &Path) -> ArchiveResult<PathBuf> {
    let mut safe_path = dest_dir.to_path_buf();

    for component in entry_path.components() {
        match component {
            std::path::Component::Normal(name) => {
                safe_path.push(name);
            },
            std::path::Component::ParentDir => {
                return Err(MagpieError::Extract {
                    entry: entry_path.display().to_string(),
                    reason: "directory traversal".to_string(),
                });
            },
            std::path::Component::RootDir => {
                return Err(MagpieError::Extract {
                    entry: entry_path.display().to_string(),
                    reason: "absolute path".to_string(),
                });
            },
            _ => {
                // Current-dir and prefix components carry no path weight
                continue;
            },
        }
    }

    if !safe_path.starts_with(dest_dir) {
        return Err(MagpieError::Extract {
            entry: entry_path.display().to_string(),
            reason: "path escapes destination".to_string(),
        });
    }

    Ok(safe_path)
}

/// Stream a regular file entry to disk
fn extract_regular_file<R: Read>(entry: &mut tar::Entry<R>, dest_path: &Path) -> ArchiveResult<()> {
    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| MagpieError::io("Failed to create parent directory".to_string(), e))?;
    }

    let mut file = fs::File::create(dest_path)
        .map_err(|e| MagpieError::io(format!("Failed to create {}", dest_path.display()), e))?;

    std::io::copy(entry, &mut file)
        .map_err(|e| MagpieError::io("Failed to write file contents".to_string(), e))?;

    Ok(())
}

/// Re-create a symlink entry, rejecting targets that escape the destination
fn extract_symlink<R: Read>(
    entry: &mut tar::Entry<R>,
    dest_path: &Path,
    dest_dir: &Path,
) -> ArchiveResult<()> {
    let Ok(Some(target_path)) = entry.link_name() else {
        return Ok(());
    };

    if target_path.is_absolute() {
        return Err(MagpieError::Extract {
            entry: dest_path.display().to_string(),
            reason: "absolute symlink target".to_string(),
        });
    }

    let resolved_target = dest_path.parent().unwrap_or(dest_dir).join(&target_path);
    if !resolved_target.starts_with(dest_dir) {
        return Err(MagpieError::Extract {
            entry: dest_path.display().to_string(),
            reason: "symlink escapes destination".to_string(),
        });
    }

    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| MagpieError::io("Failed to create parent directory".to_string(), e))?;
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target_path, dest_path)
            .map_err(|e| MagpieError::io("Failed to create symlink".to_string(), e))?;
    }
    #[cfg(windows)]
    {
        // Symlinks in build output are not recreated on Windows
        let _ = (target_path, dest_path);
    }

    Ok(())
}
