//! Environment-backed configuration types.
//!
//! Each type reads through an injectable `lookup` closure instead of the
//! process environment directly, so tests can feed configuration from a map
//! without mutating global state. `from_env` constructors wire the closure
//! to `std::env::var`.

use std::path::{Path, PathBuf};

use magpie_core::error::{MagpieError, MagpieResult};

/// Default upload chunk size: 32 MiB
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024 * 1024;

/// Default name of the cached subdirectory under the target path
pub const DEFAULT_CACHE_DIR: &str = "build";

/// Action inputs controlling restore and save behavior
#[derive(Debug, Clone)]
pub struct ActionConfig {
    /// Resolved project directory containing the cached subdirectory
    pub target_path: PathBuf,
    /// Name of the subdirectory under the target path that gets archived
    pub cache_dir: String,
    /// Fail the run outright when the lookup misses
    pub fail_on_cache_miss: bool,
    /// Check for a hit without extracting or saving
    pub lookup_only: bool,
    /// Upload chunk size in bytes
    pub chunk_size: usize,
}

impl ActionConfig {
    pub fn from_env() -> MagpieResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the action inputs through `lookup`.
    ///
    /// The target path input is required and is resolved against the runner
    /// workspace directory (falling back to the current directory), matching
    /// how the composite steps around the action resolve it. The resolved
    /// directory must exist.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> MagpieResult<Self> {
        let raw_target =
            non_empty(lookup("INPUT_TARGET_PATH")).ok_or_else(|| MagpieError::Config {
                field: "INPUT_TARGET_PATH".to_string(),
                reason: "not set".to_string(),
            })?;

        let workspace = non_empty(lookup("GITHUB_WORKSPACE"))
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default();
        let target_path = resolve(&workspace, Path::new(&raw_target));

        if !target_path.is_dir() {
            return Err(MagpieError::Config {
                field: "INPUT_TARGET_PATH".to_string(),
                reason: format!("directory not found: {}", target_path.display()),
            });
        }

        Ok(Self {
            target_path,
            cache_dir: non_empty(lookup("INPUT_CACHE_DIR"))
                .unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string()),
            fail_on_cache_miss: is_true(lookup("INPUT_FAIL_ON_CACHE_MISS")),
            lookup_only: is_true(lookup("INPUT_LOOKUP_ONLY")),
            chunk_size: parse_chunk_size(lookup("INPUT_UPLOAD_CHUNK_SIZE")),
        })
    }

    /// Full path of the subdirectory that gets archived and restored
    pub fn cache_path(&self) -> PathBuf {
        self.target_path.join(&self.cache_dir)
    }

    /// Project identity the cache key is derived from
    pub fn project_name(&self) -> MagpieResult<String> {
        self.target_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| MagpieError::Config {
                field: "INPUT_TARGET_PATH".to_string(),
                reason: format!("no directory name in: {}", self.target_path.display()),
            })
    }
}

/// Connection settings for the remote cache service.
///
/// `None` from the constructors means the service is unavailable for this
/// run. That is a normal condition, not an error: restores degrade to a miss
/// and saves are skipped.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
    pub token: String,
}

impl ServiceConfig {
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        Some(Self {
            base_url: non_empty(lookup("ACTIONS_CACHE_URL"))?,
            token: non_empty(lookup("ACTIONS_RUNTIME_TOKEN"))?,
        })
    }
}

/// Files the runner provides for state and output exchange
#[derive(Debug, Clone, Default)]
pub struct RunnerPaths {
    /// Cross-phase state file (`GITHUB_STATE`)
    pub state_file: Option<PathBuf>,
    /// Step output file (`GITHUB_OUTPUT`)
    pub output_file: Option<PathBuf>,
}

impl RunnerPaths {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            state_file: non_empty(lookup("GITHUB_STATE")).map(PathBuf::from),
            output_file: non_empty(lookup("GITHUB_OUTPUT")).map(PathBuf::from),
        }
    }
}

/// Upload chunk size from the environment, defaulting to 32 MiB.
///
/// The post phase reads this on its own: the rest of the action inputs come
/// from persisted state there, not from the environment.
pub fn chunk_size_from_env() -> usize {
    parse_chunk_size(std::env::var("INPUT_UPLOAD_CHUNK_SIZE").ok())
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn parse_chunk_size(value: Option<String>) -> usize {
    value
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&size| size > 0)
        .unwrap_or(DEFAULT_CHUNK_SIZE)
}

fn is_true(value: Option<String>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
