//! The post phase: save the build output when the main phase missed.
//!
//! Every precondition failure here is a graceful skip, not an error — a
//! post step that cannot save must never fail the job after the build
//! itself succeeded.

use magpie_archive::Archiver;
use magpie_core::error::{MagpieError, MagpieResult};
use magpie_core::{RunState, StateStore};
use magpie_service::{save_cache, CacheServiceClient};

use crate::output::OutputHandler;

/// Execute the post phase
pub async fn execute(
    client: Option<&CacheServiceClient>,
    archiver: &dyn Archiver,
    state: &dyn StateStore,
    output: &OutputHandler,
    chunk_size: usize,
) -> MagpieResult<()> {
    let Some(run_state) = RunState::load(state) else {
        output.info("Missing state; skipping save.");
        return Ok(());
    };

    if RunState::hit(state) || run_state.lookup_only {
        output.info("Skipping save (cache hit or lookup-only).");
        return Ok(());
    }

    if !run_state.cache_path.is_dir() {
        output.warn(&format!(
            "Cache directory not found: {}; skipping save.",
            run_state.cache_path.display()
        ));
        return Ok(());
    }

    let Some(client) = client else {
        output.info("Cache service not available; skipping save.");
        return Ok(());
    };

    let subdir = run_state
        .cache_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| MagpieError::Config {
            field: "CACHE_PATH".to_string(),
            reason: format!("no directory name in: {}", run_state.cache_path.display()),
        })?;

    output.info(&format!("Saving cache: {}", run_state.cache_key));

    // Unique temp name; deleted on drop whether or not the upload succeeds.
    let archive = tempfile::Builder::new()
        .prefix("magpie-")
        .suffix(".tar.zst")
        .tempfile()
        .map_err(|e| MagpieError::io("Failed to create temporary archive".to_string(), e))?
        .into_temp_path();

    output.info("Creating archive…");
    let size = archiver
        .create(&run_state.target_path, &subdir, &archive)
        .await?;
    output.info(&format!("Archive size: {} bytes.", size));

    save_cache(
        client,
        &run_state.cache_key,
        &run_state.cache_version,
        &archive,
        chunk_size,
    )
    .await?;

    output.info("Cache saved.");
    Ok(())
}
