//! Export run - the single-use two-phase state machine
//!
//! `ExportRun` (empty registry) is consumed by [`ExportRun::populate`],
//! which yields a [`PopulatedRun`] only once every producer has joined.
//! `PopulatedRun` is in turn consumed by [`PopulatedRun::generate`].
//! Neither step can be repeated, and rendering an incomplete graph is not
//! expressible.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::generation::{generate_files, RenderedFiles};
use crate::population::PopulationPlan;
use std::sync::Arc;
use tfexport_registry::{DummyVariable, ResourceParameter, ResourceRegistry};
use tracing::{info, instrument};

/// Everything a successful run produces
#[derive(Debug, Clone, Default)]
pub struct ExportOutput {
    /// Rendered text per output artifact
    pub files: RenderedFiles,
    /// Placeholders substituted for secrets
    pub dummy_variables: Vec<DummyVariable>,
    /// Template parameters attached to exported objects
    pub parameters: Vec<ResourceParameter>,
}

/// An export run before population
pub struct ExportRun {
    config: PipelineConfig,
    registry: Arc<ResourceRegistry>,
}

impl ExportRun {
    /// Start a run with an empty registry
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: Arc::new(ResourceRegistry::new()),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage of the plan and wait for all producers
    #[instrument(skip_all, fields(stages = plan.stage_count(), producers = plan.producer_count()))]
    pub async fn populate(self, plan: &PopulationPlan) -> Result<PopulatedRun> {
        plan.run(&self.registry, &self.config).await?;

        info!(resources = self.registry.len(), "Population complete");

        Ok(PopulatedRun {
            registry: self.registry,
        })
    }
}

/// An export run whose population phase has joined
pub struct PopulatedRun {
    registry: Arc<ResourceRegistry>,
}

impl PopulatedRun {
    /// Read-only view of the complete registry
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Render every descriptor and collect the run's output
    #[instrument(skip_all, fields(resources = self.registry.len()))]
    pub async fn generate(self) -> Result<ExportOutput> {
        let files = generate_files(self.registry.clone()).await?;

        Ok(ExportOutput {
            files,
            dummy_variables: self.registry.dummy_variables(),
            parameters: self.registry.parameters(),
        })
    }
}
