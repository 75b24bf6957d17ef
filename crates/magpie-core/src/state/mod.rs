//! Cross-phase run state.
//!
//! The main phase decides what the post phase must do (save or skip), but the
//! two phases run as separate processes. The decision travels through the
//! runner's state mechanism: the main process appends `NAME=value` lines to
//! the state file, and the runner re-exposes them to the post process as
//! `STATE_NAME` environment variables.
//!
//! The store is abstracted behind [`StateStore`] so phase logic can be tested
//! without a real runner environment.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{MagpieError, MagpieResult};

/// State keys shared between the main and post phases
pub mod keys {
    pub const CACHE_KEY: &str = "CACHE_KEY";
    pub const CACHE_VERSION: &str = "CACHE_VERSION";
    pub const CACHE_PATH: &str = "CACHE_PATH";
    pub const TARGET_PATH: &str = "TARGET_PATH";
    pub const LOOKUP_ONLY: &str = "LOOKUP_ONLY";
    pub const CACHE_HIT: &str = "CACHE_HIT";
}

/// Flat string-keyed persistence shared between the two phases
pub trait StateStore: Send + Sync {
    /// Record a value for the next phase
    fn set(&self, name: &str, value: &str) -> MagpieResult<()>;

    /// Read a value recorded by a previous phase
    fn get(&self, name: &str) -> Option<String>;
}

/// State store backed by the runner's state file and environment.
///
/// Writes append `NAME=value` lines to the state file; reads come back as
/// `STATE_NAME` environment variables in the post process. When the runner
/// did not provide a state file, writes are silently dropped — the post
/// phase then sees incomplete state and skips.
pub struct RunnerStateStore {
    state_file: Option<PathBuf>,
}

impl RunnerStateStore {
    pub fn new(state_file: Option<PathBuf>) -> Self {
        Self { state_file }
    }
}

impl StateStore for RunnerStateStore {
    fn set(&self, name: &str, value: &str) -> MagpieResult<()> {
        let Some(path) = &self.state_file else {
            return Ok(());
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                MagpieError::io(format!("Failed to open state file: {}", path.display()), e)
            })?;

        writeln!(file, "{}={}", name, value)
            .map_err(|e| MagpieError::io("Failed to write state".to_string(), e))
    }

    fn get(&self, name: &str) -> Option<String> {
        std::env::var(format!("STATE_{}", name))
            .ok()
            .filter(|v| !v.is_empty())
    }
}

/// In-memory state store for tests and embedding
#[derive(Default)]
pub struct MemoryStateStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn set(&self, name: &str, value: &str) -> MagpieResult<()> {
        self.values
            .lock()
            .expect("state store lock poisoned")
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, name: &str) -> Option<String> {
        self.values
            .lock()
            .expect("state store lock poisoned")
            .get(name)
            .cloned()
    }
}

/// State produced by the main phase and consumed by the post phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    pub cache_key: String,
    pub cache_version: String,
    /// Full path of the cached subdirectory (the archive content)
    pub cache_path: PathBuf,
    /// Full path of the directory the archive is created from / extracted into
    pub target_path: PathBuf,
    pub lookup_only: bool,
}

impl RunState {
    /// Persist this state for the post phase.
    ///
    /// Called before the lookup network call so the post phase can still see
    /// the state when a later main-phase step fails.
    pub fn persist(&self, store: &dyn StateStore) -> MagpieResult<()> {
        store.set(keys::CACHE_KEY, &self.cache_key)?;
        store.set(keys::CACHE_VERSION, &self.cache_version)?;
        store.set(keys::CACHE_PATH, &self.cache_path.to_string_lossy())?;
        store.set(keys::TARGET_PATH, &self.target_path.to_string_lossy())?;
        store.set(keys::LOOKUP_ONLY, bool_str(self.lookup_only))
    }

    /// Load persisted state, or `None` when any required field is absent.
    ///
    /// An empty value counts as absent. Incomplete state is not an error: it
    /// usually means the main phase aborted before the persist step, and the
    /// post phase should skip.
    pub fn load(store: &dyn StateStore) -> Option<Self> {
        Some(Self {
            cache_key: non_empty(store.get(keys::CACHE_KEY))?,
            cache_version: non_empty(store.get(keys::CACHE_VERSION))?,
            cache_path: PathBuf::from(non_empty(store.get(keys::CACHE_PATH))?),
            target_path: PathBuf::from(non_empty(store.get(keys::TARGET_PATH))?),
            lookup_only: is_true(store.get(keys::LOOKUP_ONLY)),
        })
    }

    /// Record the main-phase lookup outcome
    pub fn record_hit(store: &dyn StateStore, hit: bool) -> MagpieResult<()> {
        store.set(keys::CACHE_HIT, bool_str(hit))
    }

    /// Read the recorded lookup outcome, defaulting to miss
    pub fn hit(store: &dyn StateStore) -> bool {
        is_true(store.get(keys::CACHE_HIT))
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn is_true(value: Option<String>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> RunState {
        RunState {
            cache_key: "magpie-demo".to_string(),
            cache_version: "abc123".to_string(),
            cache_path: PathBuf::from("/work/demo/build"),
            target_path: PathBuf::from("/work/demo"),
            lookup_only: false,
        }
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStateStore::new();
        let state = sample_state();

        state.persist(&store).unwrap();
        assert_eq!(RunState::load(&store), Some(state));
    }

    #[test]
    fn test_load_requires_every_field() {
        let incomplete = MemoryStateStore::new();
        incomplete.set(keys::CACHE_KEY, "magpie-demo").unwrap();
        assert_eq!(RunState::load(&incomplete), None);

        // An empty value counts as absent too
        let store = MemoryStateStore::new();
        sample_state().persist(&store).unwrap();
        store.set(keys::CACHE_VERSION, "").unwrap();
        assert_eq!(RunState::load(&store), None);
    }

    #[test]
    fn test_hit_flag_round_trip() {
        let store = MemoryStateStore::new();
        assert!(!RunState::hit(&store));

        RunState::record_hit(&store, true).unwrap();
        assert!(RunState::hit(&store));

        RunState::record_hit(&store, false).unwrap();
        assert!(!RunState::hit(&store));
    }

    #[test]
    fn test_lookup_only_parsing_is_case_insensitive() {
        let store = MemoryStateStore::new();
        let mut state = sample_state();
        state.lookup_only = true;
        state.persist(&store).unwrap();

        store.set(keys::LOOKUP_ONLY, "TRUE").unwrap();
        assert!(RunState::load(&store).unwrap().lookup_only);
    }

    #[test]
    fn test_runner_store_appends_name_value_lines() {
        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("state");

        let store = RunnerStateStore::new(Some(state_file.clone()));
        store.set(keys::CACHE_KEY, "magpie-demo").unwrap();
        store.set(keys::CACHE_HIT, "false").unwrap();

        let contents = std::fs::read_to_string(&state_file).unwrap();
        assert_eq!(contents, "CACHE_KEY=magpie-demo\nCACHE_HIT=false\n");
    }

    #[test]
    fn test_runner_store_without_state_file_drops_writes() {
        let store = RunnerStateStore::new(None);
        assert!(store.set(keys::CACHE_KEY, "magpie-demo").is_ok());
    }
}
