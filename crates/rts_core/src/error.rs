//! Error types for the game simulation.
//!
//! Gameplay validation failures never surface here: the command layer
//! reports those as [`CommandOutcome`](crate::commands::CommandOutcome)s.
//! [`GameError`] covers configuration, IO and serialization problems.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Failed to read a rules file from disk.
    #[error("Failed to read rules file '{path}': {source}")]
    RulesIo {
        /// Path to the file that failed to load.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Rules data could not be parsed.
    #[error("Failed to parse rules: {0}")]
    RulesParse(String),

    /// Rules parsed but contain values the simulation cannot run with.
    #[error("Invalid rules: {0}")]
    InvalidRules(String),

    /// Initial placement of a session entity failed.
    #[error("Session setup failed: {0}")]
    Setup(#[from] PlacementError),

    /// Failed to serialize an exported value.
    #[error("Failed to serialize {what}: {message}")]
    Serialization {
        /// What was being serialized.
        what: &'static str,
        /// Error message.
        message: String,
    },
}

/// Why a tile or footprint could not be occupied.
///
/// The `Display` text doubles as the user-facing command message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// Some covered tile lies outside the grid.
    #[error("Out of bounds")]
    OutOfBounds,
    /// Some covered tile is not free.
    #[error("Space blocked")]
    SpaceBlocked,
}
