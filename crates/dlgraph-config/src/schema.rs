//! Configuration schema definitions using serde.

use dlgraph_common::{LogFormat, LoggingConfig, Subject};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for dlgraph.
///
/// Every section has defaults, so a configuration file only needs to list
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote statistics endpoints.
    pub sources: SourcesConfig,
    /// HTTP client settings.
    pub http: HttpConfig,
    /// Snapshot and chart directories.
    pub storage: StorageConfig,
    /// Aggregation thresholds.
    pub aggregation: AggregationConfig,
    /// Chart rendering settings.
    pub charts: ChartsConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Remote statistics endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Paginated list of application releases.
    pub releases_url: String,
    /// Theme download statistics keyed by theme name.
    pub themes_url: String,
    /// Plugin download statistics keyed by plugin name.
    pub plugins_url: String,
}

impl SourcesConfig {
    /// Endpoint serving the given subject.
    pub fn url_for(&self, subject: Subject) -> &str {
        match subject {
            Subject::Releases => &self.releases_url,
            Subject::Themes => &self.themes_url,
            Subject::Plugins => &self.plugins_url,
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

/// Where snapshots and charts are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Raw JSON documents as fetched.
    pub raw_dir: PathBuf,
    /// Processed CSV snapshots and derived tables.
    pub processed_dir: PathBuf,
    /// Rendered PNG charts.
    pub charts_dir: PathBuf,
}

/// Aggregation thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Versions with total downloads not above this value are dropped.
    pub low_volume_threshold: u64,
}

/// Chart rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Font family for captions and labels.
    pub font_family: String,
    /// Background colour (hex).
    pub background_color: String,
    /// Stacked segment colours for the release charts.
    pub platform_colors: PlatformColors,
    /// Gradient stops used to colour themes and plugins by age.
    pub diverging_palette: Vec<String>,
    /// Colours cycled through for difference intervals.
    pub qualitative_palette: Vec<String>,
    /// Label every n-th entity on theme and plugin charts.
    pub tick_every: usize,
    /// Number of entities per legend entry on sorted charts.
    pub legend_range: usize,
}

/// Colour of each platform in release charts (hex).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformColors {
    /// Linux segment.
    pub linux: String,
    /// Windows segment.
    pub windows: String,
    /// macOS segment.
    pub mac: String,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level filter, `RUST_LOG` takes precedence.
    pub level: String,
    /// Output style.
    pub format: LogFormat,
}

impl From<&LoggingSettings> for LoggingConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            level: settings.level.clone(),
            format: settings.format,
            ..LoggingConfig::default()
        }
    }
}
