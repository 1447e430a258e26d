//! tfexport library
//!
//! Exports a deployment server snapshot as Terraform configuration:
//! - Snapshot loading
//! - Producers for environments, accounts, projects and variables
//! - HCL rendering
//! - Directory and console sinks

pub mod config;
pub mod error;
pub mod hcl;
pub mod producers;
pub mod sink;
pub mod snapshot;

pub use config::ExportConfig;
pub use error::{CliError, CliResult};
pub use producers::build_plan;
pub use sink::{ConsoleSink, DirectorySink, OutputSink};
pub use snapshot::Snapshot;

use std::sync::Arc;
use tfexport_pipeline::{ExportOutput, ExportRun, PipelineConfig};
use tracing::{info, instrument};

/// Populate a registry from the snapshot and render it
#[instrument(skip_all, fields(space = %snapshot.space))]
pub async fn export(snapshot: Arc<Snapshot>, config: PipelineConfig) -> CliResult<ExportOutput> {
    let plan = build_plan(snapshot);

    let output = ExportRun::new(config)?
        .populate(&plan)
        .await?
        .generate()
        .await?;

    info!(
        files = output.files.len(),
        dummy_variables = output.dummy_variables.len(),
        "Export rendered"
    );
    Ok(output)
}

/// Pick the sink the configuration asks for
pub fn sink_for(config: &crate::config::OutputConfig) -> Box<dyn OutputSink> {
    if config.console {
        Box::new(ConsoleSink)
    } else {
        Box::new(DirectorySink::new(&config.directory))
    }
}
