//! tfexport - Export a deployment server snapshot as Terraform configuration

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tfexport::{export, sink_for, CliError, CliResult, ExportConfig, Snapshot};
use tfexport_pipeline::FailurePolicy;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// tfexport CLI
#[derive(Parser)]
#[command(name = "tfexport")]
#[command(about = "Export a deployment server snapshot as Terraform configuration", long_about = None)]
#[command(version)]
struct Cli {
    /// Snapshot file to export
    #[arg(short, long, env = "TFEXPORT_SNAPSHOT")]
    snapshot: PathBuf,

    /// Configuration file path
    #[arg(short, long, env = "TFEXPORT_CONFIG")]
    config: Option<String>,

    /// Output directory
    #[arg(short, long, conflicts_with = "console")]
    output: Option<String>,

    /// Print artifacts instead of writing files
    #[arg(long)]
    console: bool,

    /// Maximum number of producers running at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Abort remaining producers on the first failure
    #[arg(long)]
    fail_fast: bool,

    /// Log level
    #[arg(long, env = "TFEXPORT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "TFEXPORT_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = ExportConfig::load(cli.config.as_deref())
        .map_err(|e| CliError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(directory) = cli.output {
        config.output.directory = directory;
        config.output.console = false;
    }
    if cli.console {
        config.output.console = true;
    }
    if let Some(concurrency) = cli.concurrency {
        config.pipeline.max_concurrent_producers = concurrency;
    }
    if cli.fail_fast {
        config.pipeline.failure_policy = FailurePolicy::FailFast;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    // Logs go to stderr so console output stays clean.
    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let snapshot = Arc::new(Snapshot::load(&cli.snapshot).await?);
    let output = export(snapshot, config.pipeline.clone()).await?;

    sink_for(&config.output).write(&output).await?;

    for dummy in &output.dummy_variables {
        warn!(
            variable = %dummy.variable_name,
            resource = %dummy.resource_name,
            resource_type = %dummy.resource_type,
            "Secret replaced by a placeholder variable"
        );
    }

    Ok(())
}
