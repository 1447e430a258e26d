//! Render error types
//!
//! Registry queries never fail; a lookup miss degrades to an empty
//! expression. The only error this crate defines is the one a deferred
//! render function hands back to the generation phase.

use thiserror::Error;

/// Failure produced by a descriptor's render function
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Failed to encode {resource}: {reason}")]
    Encode { resource: String, reason: String },

    #[error("Resource {resource} is missing required field `{field}`")]
    MissingField { resource: String, field: String },

    #[error("{0}")]
    Custom(String),
}

impl RenderError {
    /// Encoding failure for the named resource
    pub fn encode(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encode {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// Required field absent from the source object
    pub fn missing_field(resource: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            resource: resource.into(),
            field: field.into(),
        }
    }
}

/// Result type for registry and render operations
pub type Result<T> = std::result::Result<T, RenderError>;

/// Result type returned by render functions
pub type RenderResult = Result<String>;
