//! Pipeline error types

use tfexport_registry::RenderError;
use thiserror::Error;

/// Failure inside a single producer
#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("Failed to fetch {kind}: {reason}")]
    Fetch { kind: String, reason: String },

    #[error("Invalid {kind} {id}: {reason}")]
    Invalid {
        kind: String,
        id: String,
        reason: String,
    },

    #[error("Producer panicked: {0}")]
    Panicked(String),

    #[error("Producer was cancelled")]
    Cancelled,

    #[error("{0}")]
    Custom(String),
}

impl ProducerError {
    pub fn fetch(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid(kind: impl Into<String>, id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            kind: kind.into(),
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// A producer failure tagged with the producer's name
#[derive(Debug, Error)]
#[error("{producer}: {source}")]
pub struct ProducerFailure {
    pub producer: String,
    pub source: ProducerError,
}

/// Every failure collected from one population group
#[derive(Debug, Error)]
#[error("{} producer(s) failed:\n{}", .failures.len(), join_lines(.failures))]
pub struct PopulationError {
    pub failures: Vec<ProducerFailure>,
}

/// A render failure tagged with the descriptor it came from
#[derive(Debug, Error)]
#[error("{resource}: {source}")]
pub struct RenderFailure {
    /// Registry position of the descriptor, used to order reports
    pub index: usize,
    pub resource: String,
    pub source: RenderError,
}

/// Every render failure of a generation phase, joined into one error
#[derive(Debug, Error)]
#[error("{} resource(s) failed to render:\n{}", .failures.len(), join_lines(.failures))]
pub struct GenerationError {
    pub failures: Vec<RenderFailure>,
}

/// Errors surfaced to the caller of an export run
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    #[error("Population stage `{stage}` failed: {source}")]
    Population {
        stage: String,
        source: PopulationError,
    },

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, ExportError>;

fn join_lines<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| format!("  {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}
