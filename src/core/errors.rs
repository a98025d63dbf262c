//! Error types shared across the crate
//!
//! Library code returns these; the runner wraps them in `anyhow` with
//! context before they reach the user.

use crate::font::format::FontFormat;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single file produced no [`FontRecord`](crate::font::FontRecord)
#[derive(Error, Debug)]
pub enum ExtractError {
    /// A recognized format that we can neither parse nor render
    #[error("{filename} ({format}) is not supported")]
    UnsupportedFormat { filename: String, format: FontFormat },

    #[error("failed to read {filename}: {source}")]
    Read {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    /// Anything unexpected, including a panic inside the parser
    #[error("failed to extract {filename}: {message}")]
    Internal { filename: String, message: String },
}

impl ExtractError {
    pub fn filename(&self) -> &str {
        match self {
            ExtractError::UnsupportedFormat { filename, .. }
            | ExtractError::Read { filename, .. }
            | ExtractError::Internal { filename, .. } => filename,
        }
    }

    /// True for the one failure the user gets told about
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, ExtractError::UnsupportedFormat { .. })
    }
}

/// Failures of the on-disk persistence store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt storage file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage task failed: {0}")]
    Task(String),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}
