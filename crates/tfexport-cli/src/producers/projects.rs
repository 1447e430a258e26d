//! Producer for projects, their deployment process and steps

use super::{file_name, Slugs, ACCOUNT, DEPLOYMENT_PROCESS, ENVIRONMENT, PROJECT, STEP};
use crate::hcl::{Block, Value};
use crate::snapshot::{Project, Snapshot, Step};
use async_trait::async_trait;
use std::sync::Arc;
use tfexport_pipeline::{Producer, ProducerError};
use tfexport_registry::{RenderError, ResourceDescriptor, ResourceRegistry};
use tracing::debug;

/// Exports projects together with their deployment process and steps
///
/// The deployment process has no block of its own: it is addressed
/// through the project, and may be referenced by either the project id
/// or the process id.
pub struct ProjectProducer {
    snapshot: Arc<Snapshot>,
}

impl ProjectProducer {
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl Producer for ProjectProducer {
    fn name(&self) -> &str {
        "projects"
    }

    async fn populate(&self, registry: Arc<ResourceRegistry>) -> Result<(), ProducerError> {
        let mut project_slugs = Slugs::default();
        let mut step_slugs = Slugs::default();

        for project in &self.snapshot.projects {
            validate(project)?;
            if registry.exists(PROJECT, &project.id) {
                continue;
            }

            let slug = project_slugs.claim(&project.name);
            let kept = registry.insert(describe(project, &slug, &mut step_slugs));
            debug!(project = %project.name, kept, "Project inserted");
        }
        Ok(())
    }
}

fn validate(project: &Project) -> Result<(), ProducerError> {
    if project.id.is_empty() {
        return Err(ProducerError::invalid(PROJECT, &project.name, "missing id"));
    }
    if let Some(step) = project.steps.iter().find(|s| s.id.is_empty()) {
        return Err(ProducerError::invalid(
            STEP,
            &step.name,
            format!("missing id in project {}", project.id),
        ));
    }
    Ok(())
}

fn describe(project: &Project, slug: &str, step_slugs: &mut Slugs) -> Vec<ResourceDescriptor> {
    let file = file_name("project", slug);
    let process_id = project
        .deployment_process_id
        .clone()
        .unwrap_or_else(|| format!("deploymentprocess-{}", project.id));

    let mut descriptors = Vec::with_capacity(project.steps.len() + 2);

    let environment_ids = project.environment_ids.clone();
    let name = project.name.clone();
    let description = project.description.clone();
    let block_name = slug.to_string();
    descriptors.push(
        ResourceDescriptor::new(&project.id, PROJECT)
            .with_name(&project.name)
            .with_lookup(format!("deployment_project.{slug}.id"))
            .with_dependency(format!("deployment_project.{slug}"))
            .with_file_name(&file)
            .with_render(move |registry| {
                Ok(Block::resource("deployment_project", &block_name)
                    .attribute("name", Value::string(&name))
                    .optional(
                        "description",
                        (!description.is_empty()).then(|| Value::string(&description)),
                    )
                    .attribute(
                        "environments",
                        Value::expressions(registry.resolve_many(ENVIRONMENT, &environment_ids)),
                    )
                    .render())
            }),
    );

    descriptors.push(
        ResourceDescriptor::new(&project.id, DEPLOYMENT_PROCESS)
            .with_alternate_id(&process_id)
            .with_parent_id(&project.id)
            .with_name(&project.name)
            .with_lookup(format!("deployment_project.{slug}.deployment_process_id"))
            .with_dependency(format!("deployment_project.{slug}"))
            .with_version(
                format!("deployment_project.{slug}.deployment_process_version"),
                project
                    .deployment_process_version
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            )
            .with_file_name(&file),
    );

    for (position, step) in project.steps.iter().enumerate() {
        let step_slug = step_slugs.claim(&format!("{slug} {}", step.name));
        descriptors.push(describe_step(
            project,
            &process_id,
            &file,
            &step_slug,
            position as i64,
            step,
        ));
    }

    descriptors
}

fn describe_step(
    project: &Project,
    process_id: &str,
    file: &str,
    slug: &str,
    sort_order: i64,
    step: &Step,
) -> ResourceDescriptor {
    let label = format!("{STEP}/{}", step.id);
    let project_id = project.id.clone();
    let process_id = process_id.to_string();
    let owned = step.clone();
    let block_name = slug.to_string();

    ResourceDescriptor::new(&step.id, STEP)
        .with_parent_id(&project.id)
        .with_name(&step.name)
        .with_sort_order(sort_order)
        .with_lookup(format!("deployment_process_step.{slug}.id"))
        .with_dependency(format!("deployment_process_step.{slug}"))
        .with_file_name(file)
        .with_render(move |registry| {
            let step = &owned;
            let action_type = step
                .action_type
                .as_deref()
                .ok_or_else(|| RenderError::missing_field(&label, "action_type"))?;

            // Steps run in order, so each one waits on its predecessor.
            let previous = registry
                .select_by_type_below_sort(STEP, sort_order)
                .into_iter()
                .filter(|s| s.parent_id() == Some(project_id.as_str()))
                .max_by_key(|s| s.sort_order())
                .map(|s| s.dependency().to_string());

            Ok(Block::resource("deployment_process_step", &block_name)
                .attribute(
                    "process_id",
                    Value::expression(registry.resolve(DEPLOYMENT_PROCESS, &process_id)),
                )
                .attribute("name", Value::string(&step.name))
                .attribute("action_type", Value::string(action_type))
                .optional(
                    "account_id",
                    step.account_id
                        .as_deref()
                        .map(|id| Value::expression(registry.resolve(ACCOUNT, id))),
                )
                .optional("script", step.script.as_deref().map(Value::string))
                .optional("depends_on", previous.map(|d| Value::expressions([d])))
                .render())
        })
}
