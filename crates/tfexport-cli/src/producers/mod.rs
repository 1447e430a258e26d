//! Producers turning snapshot objects into registry descriptors
//!
//! Each producer reads one kind of object from the shared [`Snapshot`]
//! and inserts descriptors whose render functions emit HCL. Producers of
//! later stages reference objects inserted by earlier ones.

mod accounts;
mod environments;
mod projects;
mod variables;

pub use accounts::AccountProducer;
pub use environments::EnvironmentProducer;
pub use projects::ProjectProducer;
pub use variables::VariableProducer;

use crate::hcl::sanitize_name;
use crate::snapshot::Snapshot;
use std::collections::HashSet;
use std::sync::Arc;
use tfexport_pipeline::{PopulationPlan, Producer};

pub const ENVIRONMENT: &str = "Environment";
pub const ACCOUNT: &str = "Account";
pub const PROJECT: &str = "Project";
pub const DEPLOYMENT_PROCESS: &str = "DeploymentProcess";
pub const STEP: &str = "Step";
pub const VARIABLE: &str = "Variable";

/// Build the staged plan exporting every object of the snapshot
///
/// Environments and accounts are referenced by projects and steps, which
/// are in turn referenced by variables.
pub fn build_plan(snapshot: Arc<Snapshot>) -> PopulationPlan {
    PopulationPlan::new()
        .stage(
            "environments and accounts",
            [
                Arc::new(EnvironmentProducer::new(snapshot.clone())) as Arc<dyn Producer>,
                Arc::new(AccountProducer::new(snapshot.clone())) as Arc<dyn Producer>,
            ],
        )
        .stage(
            "projects",
            [Arc::new(ProjectProducer::new(snapshot.clone())) as Arc<dyn Producer>],
        )
        .stage(
            "variables",
            [Arc::new(VariableProducer::new(snapshot)) as Arc<dyn Producer>],
        )
}

/// Artifact name for one exported object
pub(crate) fn file_name(kind: &str, slug: &str) -> String {
    format!("{kind}_{slug}.tf")
}

/// Terraform identifiers already handed out for one resource kind
///
/// Names that differ only in case or punctuation sanitize to the same
/// identifier; later claimants get the first free numeric suffix.
#[derive(Debug, Default)]
pub(crate) struct Slugs {
    taken: HashSet<String>,
}

impl Slugs {
    /// Reserve a unique identifier derived from `name`
    pub(crate) fn claim(&mut self, name: &str) -> String {
        let base = sanitize_name(name);
        if self.taken.insert(base.clone()) {
            return base;
        }

        let mut n = 2;
        loop {
            let candidate = format!("{base}_{n}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_stages() {
        let plan = build_plan(Arc::new(Snapshot::default()));
        assert_eq!(plan.stage_count(), 3);
        assert_eq!(plan.producer_count(), 4);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("project", "web_frontend"), "project_web_frontend.tf");
    }

    #[test]
    fn test_slugs_never_repeat() {
        let mut slugs = Slugs::default();

        assert_eq!(slugs.claim("Url 2"), "url_2");
        assert_eq!(slugs.claim("Url"), "url");
        assert_eq!(slugs.claim("url"), "url_3");
        assert_eq!(slugs.claim("URL!"), "url_4");
        assert_eq!(slugs.claim("Web App"), "web_app");
        assert_eq!(slugs.claim("web-app"), "web_app_2");
    }
}
