//! Dummy-variable ledger entries

use serde::{Deserialize, Serialize};

/// Records that a placeholder was exported in place of a secret value
///
/// Purely informational. Entries are appended in the order producers
/// report them and are never deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DummyVariable {
    /// Terraform variable that holds the placeholder
    pub variable_name: String,
    /// Name of the object the secret belongs to
    pub resource_name: String,
    /// Kind of the object the secret belongs to
    pub resource_type: String,
}

impl DummyVariable {
    pub fn new(
        variable_name: impl Into<String>,
        resource_name: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            variable_name: variable_name.into(),
            resource_name: resource_name.into(),
            resource_type: resource_type.into(),
        }
    }
}
