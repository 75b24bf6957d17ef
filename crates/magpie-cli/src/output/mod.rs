//! Console output and runner step outputs.
//!
//! Console lines carry the fixed `[magpie]` prefix so they are easy to grep
//! out of a job log. Step outputs go to the runner's output file as
//! `name=value` lines for downstream workflow steps to consume.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use magpie_core::error::{MagpieError, MagpieResult};

/// Output handler for console lines and runner step outputs
pub struct OutputHandler {
    output_file: Option<PathBuf>,
}

impl OutputHandler {
    pub fn new(output_file: Option<PathBuf>) -> Self {
        Self { output_file }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        println!("[magpie] {}", message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        println!("[magpie] warning: {}", message);
    }

    /// Record a step output for downstream workflow steps.
    ///
    /// Appends `name=value` to the runner output file. No output file means
    /// no runner is listening, and the value is dropped.
    pub fn set_output(&self, name: &str, value: &str) -> MagpieResult<()> {
        let Some(path) = &self.output_file else {
            return Ok(());
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                MagpieError::io(format!("Failed to open output file: {}", path.display()), e)
            })?;

        writeln!(file, "{}={}", name, value)
            .map_err(|e| MagpieError::io("Failed to write output".to_string(), e))
    }
}
