//! Errors for loading and checking replay traces.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Failed to read trace {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid trace: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Trace has no steps")]
    Empty,

    #[error("Step {index} goes back in time ({at_ms}ms after {previous_ms}ms)")]
    NonMonotonic {
        index: usize,
        at_ms: u64,
        previous_ms: u64,
    },

    #[error("Step {index} is a second create; an activity is created once")]
    DuplicateCreate { index: usize },

    #[error("Step {index} sets both raw flags and obstruction booleans")]
    AmbiguousTouch { index: usize },
}
