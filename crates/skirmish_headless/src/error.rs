//! Errors surfaced by the headless runner.

use std::path::PathBuf;

use skirmish_core::error::GameError;
use thiserror::Error;

/// Result alias for runner operations.
pub type Result<T> = std::result::Result<T, HeadlessError>;

/// Anything that stops a headless run from producing a report.
#[derive(Debug, Error)]
pub enum HeadlessError {
    /// Config loading or snapshot encoding failed in the core.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Reading or writing an output file failed.
    #[error("IO error on '{path}': {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A report could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HeadlessError {
    /// Wrap an IO error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
