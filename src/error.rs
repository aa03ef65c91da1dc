//! Error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while building, training or feeding a
/// network.
#[derive(Debug, Error)]
pub enum Error {
    /// A host or device allocation could not be satisfied.
    #[error("could not allocate {bytes} bytes of device memory")]
    ResourceExhausted { bytes: usize },

    /// A pattern source could not be opened.
    #[error("cannot open pattern source {}", path.display())]
    CannotOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A pattern source was opened but its contents are malformed.
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A vector did not have the length its destination requires.
    #[error("{context}: expected length {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("training requires at least one pattern")]
    EmptyPatternSet,

    /// `run_epoch` was called on a session that already reached a terminal
    /// state.
    #[error("training session already finished")]
    TrainingFinished,

    /// A pattern produced a non-finite error while anomaly checking was set
    /// to abort.
    #[error("non-finite error in epoch {epoch} at pattern {pattern}")]
    NumericalAnomaly { epoch: usize, pattern: usize },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn shape(context: &'static str, expected: usize, actual: usize) -> Self {
        Error::ShapeMismatch {
            context,
            expected,
            actual,
        }
    }

    pub(crate) fn parameter<S: Into<String>>(name: &'static str, reason: S) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
