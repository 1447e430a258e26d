//! Producer for deployment environments

use super::{file_name, Slugs, ENVIRONMENT};
use crate::hcl::{Block, Value};
use crate::snapshot::{Environment, Snapshot};
use async_trait::async_trait;
use std::sync::Arc;
use tfexport_pipeline::{Producer, ProducerError};
use tfexport_registry::{ResourceDescriptor, ResourceRegistry};
use tracing::debug;

/// Exports deployment environments
pub struct EnvironmentProducer {
    snapshot: Arc<Snapshot>,
}

impl EnvironmentProducer {
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl Producer for EnvironmentProducer {
    fn name(&self) -> &str {
        "environments"
    }

    async fn populate(&self, registry: Arc<ResourceRegistry>) -> Result<(), ProducerError> {
        let mut descriptors = Vec::with_capacity(self.snapshot.environments.len());
        let mut slugs = Slugs::default();

        for environment in &self.snapshot.environments {
            if environment.id.is_empty() {
                return Err(ProducerError::invalid(ENVIRONMENT, &environment.name, "missing id"));
            }
            if registry.exists(ENVIRONMENT, &environment.id) {
                continue;
            }
            descriptors.push(describe(environment, &slugs.claim(&environment.name)));
        }

        let kept = registry.insert(descriptors);
        debug!(kept, "Environments inserted");
        Ok(())
    }
}

fn describe(environment: &Environment, slug: &str) -> ResourceDescriptor {
    let block = Block::resource("deployment_environment", slug)
        .attribute("name", Value::string(&environment.name))
        .optional(
            "description",
            (!environment.description.is_empty()).then(|| Value::string(&environment.description)),
        )
        .attribute("sort_order", Value::Number(environment.sort_order));

    ResourceDescriptor::new(&environment.id, ENVIRONMENT)
        .with_name(&environment.name)
        .with_sort_order(environment.sort_order)
        .with_lookup(format!("deployment_environment.{slug}.id"))
        .with_dependency(format!("deployment_environment.{slug}"))
        .with_file_name(file_name("environment", slug))
        .with_render(move |_| Ok(block.render()))
}
