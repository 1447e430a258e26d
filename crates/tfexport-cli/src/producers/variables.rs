//! Producer for project variables

use super::{file_name, Slugs, ENVIRONMENT, PROJECT, VARIABLE};
use crate::hcl::{Block, Value};
use crate::snapshot::{Snapshot, Variable};
use async_trait::async_trait;
use std::sync::Arc;
use tfexport_pipeline::{Producer, ProducerError};
use tfexport_registry::{
    DummyVariable, ParameterType, ResourceDescriptor, ResourceParameter, ResourceRegistry,
};
use tracing::{debug, warn};

/// Exports project variables
///
/// Sensitive values are never written. They are replaced by a Terraform
/// input variable and reported in the dummy-variable ledger.
pub struct VariableProducer {
    snapshot: Arc<Snapshot>,
}

impl VariableProducer {
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl Producer for VariableProducer {
    fn name(&self) -> &str {
        "variables"
    }

    async fn populate(&self, registry: Arc<ResourceRegistry>) -> Result<(), ProducerError> {
        // Variables commonly share a name across scopes.
        let mut slugs = Slugs::default();

        for variable in &self.snapshot.variables {
            if variable.id.is_empty() || variable.name.is_empty() {
                return Err(ProducerError::invalid(VARIABLE, &variable.id, "missing id or name"));
            }
            if variable.owner_id.is_empty() {
                return Err(ProducerError::invalid(VARIABLE, &variable.id, "missing owner"));
            }
            if registry.exists(VARIABLE, &variable.id) {
                continue;
            }

            let mut project_name = registry.resolve_name(PROJECT, &variable.owner_id);
            if project_name.is_empty() {
                warn!(variable = %variable.id, owner = %variable.owner_id, "Variable owner was not exported");
                project_name = variable.owner_id.clone();
            }

            let slug = slugs.claim(&format!("{project_name} {}", variable.name));

            let placeholder = variable.sensitive.then(|| format!("{slug}_value"));
            let kept = registry.insert([describe(variable, &project_name, &slug, placeholder.as_deref())]);
            if kept == 1 {
                if let Some(placeholder) = placeholder {
                    registry.record_dummy(DummyVariable::new(placeholder, &variable.name, VARIABLE));
                }
            }
        }

        debug!(variables = registry.count_of_type(VARIABLE), "Variables inserted");
        Ok(())
    }
}

fn describe(
    variable: &Variable,
    project_name: &str,
    slug: &str,
    placeholder: Option<&str>,
) -> ResourceDescriptor {
    let mut descriptor = ResourceDescriptor::new(&variable.id, VARIABLE)
        .with_parent_id(&variable.owner_id)
        .with_name(&variable.name)
        .with_lookup(format!("deployment_variable.{slug}.id"))
        .with_dependency(format!("deployment_variable.{slug}"))
        .with_file_name(file_name("variable", slug));

    if let Some(placeholder) = placeholder {
        descriptor = descriptor.with_parameter(
            ResourceParameter::new(placeholder, project_name, ParameterType::Sensitive)
                .with_description(format!("Sensitive value of {}", variable.name)),
        );
    }

    let variable = variable.clone();
    let placeholder = placeholder.map(str::to_string);
    let block_name = slug.to_string();

    descriptor.with_render(move |registry| {
        let value = match &placeholder {
            Some(placeholder) => Value::expression(format!("var.{placeholder}")),
            None => Value::string(variable.value.clone().unwrap_or_default()),
        };
        let scope = registry.resolve_many(ENVIRONMENT, &variable.environment_ids);

        let mut text = Block::resource("deployment_variable", &block_name)
            .attribute("owner_id", Value::expression(registry.resolve(PROJECT, &variable.owner_id)))
            .attribute("name", Value::string(&variable.name))
            .attribute("value", value)
            .attribute("is_sensitive", Value::Bool(placeholder.is_some()))
            .optional(
                "environments",
                (!scope.is_empty()).then(|| Value::expressions(scope)),
            )
            .render();

        if let Some(placeholder) = &placeholder {
            text.push('\n');
            text.push_str(
                &Block::variable(placeholder)
                    .attribute("type", Value::expression("string"))
                    .attribute("sensitive", Value::Bool(true))
                    .render(),
            );
        }

        Ok(text)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(id: &str, name: &str, sensitive: bool) -> Variable {
        Variable {
            id: id.into(),
            name: name.into(),
            owner_id: "Projects-1".into(),
            value: (!sensitive).then(|| "plain".to_string()),
            sensitive,
            environment_ids: vec!["Environments-1".into()],
        }
    }

    async fn populated(variables: Vec<Variable>) -> Arc<ResourceRegistry> {
        let registry = Arc::new(ResourceRegistry::new());
        registry.insert([
            ResourceDescriptor::new("Environments-1", ENVIRONMENT)
                .with_lookup("deployment_environment.dev.id"),
            ResourceDescriptor::new("Projects-1", PROJECT)
                .with_name("Web")
                .with_lookup("deployment_project.web.id"),
        ]);

        let snapshot = Arc::new(Snapshot {
            variables,
            ..Default::default()
        });
        VariableProducer::new(snapshot).populate(registry.clone()).await.unwrap();
        registry
    }

    #[tokio::test]
    async fn test_sensitive_value_is_replaced() {
        let registry = populated(vec![variable("v1", "DbPassword", true)]).await;

        assert_eq!(
            registry.dummy_variables(),
            vec![DummyVariable::new("web_dbpassword_value", "DbPassword", VARIABLE)]
        );
        assert_eq!(registry.parameters()[0].resource_name, "Web");

        let jobs = registry.render_jobs();
        let text = (jobs[0].render)(registry.as_ref()).unwrap();
        assert!(text.contains("value        = var.web_dbpassword_value"));
        assert!(text.contains("owner_id     = deployment_project.web.id"));
        assert!(text.contains("environments = [deployment_environment.dev.id]"));
        assert!(!text.contains("plain"));
    }

    #[tokio::test]
    async fn test_repeated_names_get_distinct_slugs() {
        let registry = populated(vec![
            variable("v1", "Url", false),
            variable("v2", "Url", false),
        ])
        .await;

        let files: Vec<String> = registry
            .render_jobs()
            .into_iter()
            .map(|job| job.file_name)
            .collect();
        assert_eq!(files, vec!["variable_web_url.tf", "variable_web_url_2.tf"]);
        assert!(registry.dummy_variables().is_empty());
    }

    #[tokio::test]
    async fn test_suffixed_name_does_not_collide() {
        let registry = populated(vec![
            variable("v1", "Url 2", false),
            variable("v2", "Url", false),
            variable("v3", "Url", false),
        ])
        .await;

        assert_eq!(registry.resolve(VARIABLE, "v1"), "deployment_variable.web_url_2.id");
        assert_eq!(registry.resolve(VARIABLE, "v2"), "deployment_variable.web_url.id");
        assert_eq!(registry.resolve(VARIABLE, "v3"), "deployment_variable.web_url_3.id");
    }

    #[tokio::test]
    async fn test_missing_owner_renders_empty_reference() {
        let mut orphan = variable("v1", "Url", false);
        orphan.owner_id = "Projects-404".into();
        let registry = populated(vec![orphan]).await;

        let jobs = registry.render_jobs();
        assert_eq!(jobs[0].file_name, "variable_projects_404_url.tf");
        let text = (jobs[0].render)(registry.as_ref()).unwrap();
        assert!(text.contains("owner_id     = \"\""));
    }
}
