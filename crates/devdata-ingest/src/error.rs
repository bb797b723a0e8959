//! Error types for batch ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a raw batch.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Batch file not found.
    #[error("batch file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read batch file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read from a stream.
    #[error("failed to read batch: {0}")]
    Read(#[source] std::io::Error),

    /// Input is not valid JSON.
    #[error("invalid JSON: {source}")]
    Parse {
        line: usize,
        column: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Top-level JSON value is neither an array nor an object stream.
    #[error("unsupported batch root: expected an array of records or one record per line, found {found}")]
    UnsupportedRoot { found: &'static str },

    /// A record is not a JSON object.
    #[error("record {index} is not a JSON object (found {found})")]
    NotAnObject { index: usize, found: &'static str },
}

impl IngestError {
    pub(crate) fn parse(source: serde_json::Error) -> Self {
        IngestError::Parse {
            line: source.line(),
            column: source.column(),
            source,
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
