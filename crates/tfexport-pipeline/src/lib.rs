//! tfexport Pipeline - Two-phase export coordination
//!
//! An export run has two rounds of concurrent work over one
//! [`ResourceRegistry`](tfexport_registry::ResourceRegistry):
//!
//! 1. **Population**: producers fetch source objects and insert descriptors.
//!    Producers run under a concurrency bound, grouped into ordered stages.
//! 2. **Generation**: once every producer has joined, each descriptor's
//!    render function runs concurrently and the texts are collected per
//!    output artifact.
//!
//! ## Failure semantics
//!
//! Generation is all or nothing: a single failing render discards every
//! rendered text and the run fails with all failures joined. Whether a
//! failing producer aborts its siblings is chosen by [`FailurePolicy`].
//!
//! ## Usage
//!
//! ```no_run
//! use tfexport_pipeline::{ExportRun, PipelineConfig, PopulationPlan};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let plan = PopulationPlan::new();
//! // .stage("environments", [...])
//! // .stage("projects", [...]);
//!
//! let output = ExportRun::new(PipelineConfig::default())?
//!     .populate(&plan)
//!     .await?
//!     .generate()
//!     .await?;
//!
//! for (file_name, text) in &output.files {
//!     println!("{file_name}:\n{text}");
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod config;
pub mod error;
pub mod generation;
pub mod population;
pub mod run;

// Re-exports
pub use config::{FailurePolicy, PipelineConfig};
pub use error::{
    ExportError, GenerationError, PopulationError, ProducerError, ProducerFailure, RenderFailure,
    Result,
};
pub use generation::{generate_files, RenderedFiles};
pub use population::{PopulationGroup, PopulationPlan, Producer};
pub use run::{ExportOutput, ExportRun, PopulatedRun};
