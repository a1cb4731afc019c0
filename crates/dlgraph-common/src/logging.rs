//! Structured logging infrastructure for dlgraph

use crate::error::{DlGraphError, Result};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output style of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human friendly output with colours
    Pretty,
    /// Single-line compact output
    #[default]
    Compact,
    /// Newline delimited JSON
    Json,
}

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "dlgraph_stats=trace")
    pub level: String,
    /// Output style
    pub format: LogFormat,
    /// Whether to include target module information
    pub include_targets: bool,
    /// Whether `RUST_LOG` may override `level`
    pub respect_env: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            include_targets: false,
            respect_env: true,
        }
    }
}

impl LoggingConfig {
    /// Builds the level filter, preferring `RUST_LOG` when allowed.
    pub fn env_filter(&self) -> EnvFilter {
        let from_env = self
            .respect_env
            .then(|| EnvFilter::try_from_default_env().ok())
            .flatten();

        from_env
            .or_else(|| EnvFilter::try_new(&self.level).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    }
}

/// Initialize the tracing subscriber with the given configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    let installed = match config.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_target(config.include_targets))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(config.include_targets))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(config.include_targets))
            .try_init(),
    };

    installed.map_err(|e| DlGraphError::config_with_source("Failed to install log subscriber", e))
}
