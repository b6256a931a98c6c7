//! Centralized error types for mboxview.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mboxview library.
///
/// Per-message parse failures never surface here: [`crate::parse_emails`]
/// converts them into placeholder records so archive positions stay intact.
/// The variants below cover file access (binary side) and the structural
/// failures reported when [`crate::parser::parse_message`] is called
/// directly on a bad block.
#[derive(Error, Debug)]
pub enum MboxViewError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("MBOX file not found: {0}")]
    FileNotFound(PathBuf),

    /// A single message block could not be parsed.
    #[error("Malformed message at archive position {index}: {reason}")]
    MalformedMessage { index: usize, reason: String },
}

/// Convenience alias for `Result<T, MboxViewError>`.
pub type Result<T> = std::result::Result<T, MboxViewError>;

impl MboxViewError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
