//! Configuration for the magpie action.
//!
//! Every knob reaches the action as an environment variable set by the
//! runner: `INPUT_*` for user-facing inputs, `ACTIONS_*` for the cache
//! service connection, and `GITHUB_*` for runner file paths. This crate
//! turns that surface into typed structs.

pub mod env;

// Re-export main types
pub use env::{chunk_size_from_env, ActionConfig, RunnerPaths, ServiceConfig, DEFAULT_CHUNK_SIZE};
