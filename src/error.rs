//! Error types for the whack-a-monkey library.

use crate::target::MarkerId;
use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A tracked marker was never seen during setup verification
    #[error("Setup failed: marker {0} was not detected")]
    MissingMarker(MarkerId),

    /// No target id can be chosen from the tracked set
    #[error("Target selection error: {0}")]
    TargetSelection(String),

    /// The frame source kept failing after all retries
    #[error("Frame capture error: {0}")]
    FrameCapture(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A session command arrived in a phase that cannot accept it
    #[error("Session state error: {0}")]
    SessionState(String),
}

/// Application-specific error type (alias for main Error type)
pub type AppError = Error;

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
