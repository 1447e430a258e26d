//! Offline snapshot of a deployment server's configuration
//!
//! The snapshot is the source the producers read from. It is loaded once
//! and shared read-only by every producer of the run.

use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// All exportable objects of one space
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub space: String,
    #[serde(default)]
    pub environments: Vec<Environment>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub variables: Vec<Variable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub account_type: String,
    /// Whether the account carries a secret the server never returns
    #[serde(default)]
    pub has_secret: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Id of the project's deployment process, addressable in place of the project
    #[serde(default)]
    pub deployment_process_id: Option<String>,
    /// Version of the deployment process at export time
    #[serde(default)]
    pub deployment_process_version: Option<u64>,
    #[serde(default)]
    pub environment_ids: Vec<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub id: String,
    pub name: String,
    /// Project owning the variable
    pub owner_id: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub environment_ids: Vec<String>,
}

impl Snapshot {
    /// Read and parse a snapshot file
    pub async fn load(path: &Path) -> CliResult<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CliError::SnapshotRead {
                path: path.to_path_buf(),
                source,
            })?;

        serde_json::from_str(&contents).map_err(|source| CliError::SnapshotParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_snapshot_parses() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{
                "environments": [{ "id": "Environments-1", "name": "Dev" }],
                "projects": [{ "id": "Projects-1", "name": "Web", "steps": [{ "id": "s1", "name": "Deploy" }] }]
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.environments[0].sort_order, 0);
        assert!(snapshot.accounts.is_empty());
        assert_eq!(snapshot.projects[0].steps[0].action_type, None);
    }

    #[tokio::test]
    async fn test_missing_file_reports_path() {
        let err = Snapshot::load(Path::new("/nonexistent/snapshot.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::SnapshotRead { .. }));
        assert!(err.to_string().contains("/nonexistent/snapshot.json"));
    }
}
