//! Error types for the tfexport command

use std::path::PathBuf;
use tfexport_pipeline::ExportError;
use thiserror::Error;

/// Command-level errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot could not be read
    #[error("Failed to read snapshot {path}: {source}")]
    SnapshotRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Snapshot is not valid JSON for the expected schema
    #[error("Invalid snapshot {path}: {source}")]
    SnapshotParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Export run failed
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Artifact could not be written
    #[error("Output error: {0}")]
    Output(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for the tfexport command
pub type CliResult<T> = std::result::Result<T, CliError>;
