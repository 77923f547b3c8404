//! Errors raised by the headless driver.

use std::path::PathBuf;

use thiserror::Error;

use rts_core::error::GameError;

/// Result type alias using [`HeadlessError`].
pub type Result<T> = std::result::Result<T, HeadlessError>;

/// Failures outside the simulation itself: files, streams and setup.
#[derive(Debug, Error)]
pub enum HeadlessError {
    /// Rules or session setup failed.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Reading or writing the protocol streams failed.
    #[error("Protocol stream error: {0}")]
    Stream(#[from] std::io::Error),

    /// An output file could not be written.
    #[error("Failed to write '{path}': {source}")]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// An input file could not be read.
    #[error("Failed to read '{path}': {source}")]
    Read {
        /// Source path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A results file did not hold the expected JSON.
    #[error("Invalid JSON in '{path}': {source}")]
    Json {
        /// Offending file.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// Repeated runs of the same seed diverged.
    #[error("Non-determinism detected for seed {seed}: {unique} distinct state hashes over {runs} runs")]
    NonDeterministic {
        /// Seed under test.
        seed: u64,
        /// Number of runs.
        runs: u32,
        /// Distinct final hashes seen.
        unique: usize,
    },
}
