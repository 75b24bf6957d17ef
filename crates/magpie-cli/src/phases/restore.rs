//! The main phase: restore the cached build output.
//!
//! Computes {key, version}, persists cross-phase state, queries the service,
//! and on a hit downloads and extracts the archive into the target
//! directory. Emits the `cache-hit` output either way.

use std::path::Path;

use magpie_archive::Archiver;
use magpie_config::ActionConfig;
use magpie_core::error::{MagpieError, MagpieResult};
use magpie_core::{compute_version, RunState, StateStore};
use magpie_service::lookup;
use magpie_service::{download_archive, CacheServiceClient, Lookup};

use crate::output::OutputHandler;

// OS component of the version fingerprint. The action runs inside a Linux
// container image, so the fingerprint must not vary with the host runner.
const OS_ID: &str = "Linux";

/// Execute the main phase; returns the hit flag
pub async fn execute(
    config: &ActionConfig,
    client: Option<&CacheServiceClient>,
    archiver: &dyn Archiver,
    state: &dyn StateStore,
    output: &OutputHandler,
) -> MagpieResult<bool> {
    let project = config.project_name()?;
    let cache_key = format!("magpie-{}", project);
    let cache_path = config.cache_path();
    let cache_version = compute_version(
        &cache_path.to_string_lossy(),
        OS_ID,
        archiver.compression_id(),
    );

    output.info(&format!("key: {}", cache_key));

    // State goes down before the network call, so the post phase still sees
    // it when a later restore step fails.
    let run_state = RunState {
        cache_key: cache_key.clone(),
        cache_version: cache_version.clone(),
        cache_path,
        target_path: config.target_path.clone(),
        lookup_only: config.lookup_only,
    };
    run_state.persist(state)?;

    let lookup = match client {
        Some(client) => lookup::query(client, &cache_key, &cache_version).await,
        None => {
            output.info("Cache service not available.");
            Lookup::Miss
        },
    };

    let hit = lookup.is_hit();
    RunState::record_hit(state, hit)?;

    if !hit && config.fail_on_cache_miss {
        return Err(MagpieError::CacheMiss { key: cache_key });
    }

    if let Lookup::Hit { location } = &lookup {
        if !config.lookup_only {
            output.info("Restoring cache…");
            restore_archive(location, &config.target_path, archiver, output).await?;
            output.info("Cache restored.");
        }
    }

    output.set_output("cache-hit", if hit { "true" } else { "false" })?;
    Ok(hit)
}

/// Download the archive to a unique temp file and extract it in place.
///
/// The temp file is deleted on drop, on every exit path.
async fn restore_archive(
    location: &str,
    target_path: &Path,
    archiver: &dyn Archiver,
    output: &OutputHandler,
) -> MagpieResult<()> {
    let archive = tempfile::Builder::new()
        .prefix("magpie-")
        .suffix(".tar.zst")
        .tempfile()
        .map_err(|e| MagpieError::io("Failed to create temporary archive".to_string(), e))?
        .into_temp_path();

    let downloaded = download_archive(location, &archive).await?;
    output.info(&format!("Downloaded {} bytes.", downloaded));

    archiver.extract(&archive, target_path).await
}
