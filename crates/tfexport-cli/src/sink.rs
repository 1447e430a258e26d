//! Destinations for rendered artifacts

use crate::error::{CliError, CliResult};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tfexport_pipeline::ExportOutput;
use tracing::{debug, info};

/// Ledger of placeholders written next to the artifacts
pub const DUMMY_VARIABLES_FILE: &str = "dummy_variables.json";

/// Template parameters written next to the artifacts
pub const PARAMETERS_FILE: &str = "parameters.json";

/// Receives the output of a successful run
#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn write(&self, output: &ExportOutput) -> CliResult<()>;
}

/// Writes one file per artifact below a root directory
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an artifact name, refusing anything outside the root
    fn target(&self, file_name: &str) -> CliResult<PathBuf> {
        let relative = Path::new(file_name);
        let contained = !file_name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

        if !contained {
            return Err(CliError::Output(format!(
                "Artifact name {file_name:?} escapes the output directory"
            )));
        }

        Ok(self.root.join(relative))
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> CliResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
        debug!(path = %path.display(), bytes = contents.len(), "Artifact written");
        Ok(())
    }
}

#[async_trait]
impl OutputSink for DirectorySink {
    async fn write(&self, output: &ExportOutput) -> CliResult<()> {
        // Validate every name before touching the filesystem.
        let targets = output
            .files
            .iter()
            .map(|(name, text)| self.target(name).map(|path| (path, text)))
            .collect::<CliResult<Vec<_>>>()?;

        tokio::fs::create_dir_all(&self.root).await?;

        for (path, text) in targets {
            self.write_file(&path, format!("{text}\n").as_bytes()).await?;
        }

        if !output.dummy_variables.is_empty() {
            let json = serde_json::to_vec_pretty(&output.dummy_variables)?;
            self.write_file(&self.root.join(DUMMY_VARIABLES_FILE), &json).await?;
        }

        if !output.parameters.is_empty() {
            let json = serde_json::to_vec_pretty(&output.parameters)?;
            self.write_file(&self.root.join(PARAMETERS_FILE), &json).await?;
        }

        info!(
            directory = %self.root.display(),
            files = output.files.len(),
            "Export written"
        );
        Ok(())
    }
}

/// Prints every artifact to stdout
pub struct ConsoleSink;

#[async_trait]
impl OutputSink for ConsoleSink {
    async fn write(&self, output: &ExportOutput) -> CliResult<()> {
        for (name, text) in &output.files {
            println!("# {name}");
            println!("{text}");
            println!();
        }
        Ok(())
    }
}
