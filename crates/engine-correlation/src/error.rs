//! Error types for engine sessions.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that prevent an engine session from starting.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// No engine binary is known for this platform/architecture.
    #[error("No engine binary for platform {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },
    /// Engine executable was not found at the resolved path.
    #[error("Engine not found at path: {}", .0.display())]
    NotFound(PathBuf),
    /// The resolved path exists but is not an executable file.
    #[error("Engine is not an executable file: {}", .0.display())]
    NotExecutable(PathBuf),
    /// Failed to spawn the engine process.
    #[error("Failed to spawn engine: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Errors that can occur while talking to an engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Launch(#[from] LaunchError),
    /// Reading from or writing to the engine pipes failed.
    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The engine output did not have the expected shape.
    #[error("Invalid engine response: {0}")]
    Parse(#[from] uci::UciError),
    /// The wait was cancelled through a [`CancelToken`](crate::CancelToken).
    #[error("Engine query cancelled")]
    Cancelled,
    /// No terminating line arrived within the configured ceiling.
    #[error("No engine response within {0:?}")]
    Timeout(Duration),
}

impl EngineError {
    /// The engine closed its output while a response was still expected.
    pub(crate) fn engine_exited() -> Self {
        EngineError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "engine closed its output",
        ))
    }
}
