//! Configuration for the tfexport command

use serde::{Deserialize, Serialize};
use tfexport_pipeline::PipelineConfig;

/// Main export configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Producer concurrency and failure policy
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where rendered artifacts are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving one file per artifact
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Print artifacts to stdout instead of writing files
    #[serde(default)]
    pub console: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            console: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_directory() -> String {
    "tfexport-out".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ExportConfig {
    /// Load configuration: defaults, then the optional file, then the environment
    ///
    /// Environment variables use the `TFEXPORT_` prefix and `__` between
    /// nested keys, e.g. `TFEXPORT_PIPELINE__MAX_CONCURRENT_PRODUCERS=4`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&ExportConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("TFEXPORT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
