//! Default values for every configuration section.

use crate::schema::*;
use dlgraph_common::LogFormat;
use std::path::PathBuf;

/// Versions at or below this many downloads are treated as internal builds.
pub const DEFAULT_LOW_VOLUME_THRESHOLD: u64 = 10_000;

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: SourcesConfig::default(),
            http: HttpConfig::default(),
            storage: StorageConfig::default(),
            aggregation: AggregationConfig::default(),
            charts: ChartsConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            releases_url: "https://api.github.com/repos/obsidianmd/obsidian-releases/releases"
                .to_string(),
            themes_url: "https://releases.obsidian.md/stats/theme".to_string(),
            plugins_url: "https://releases.obsidian.md/stats/plugin".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("dlgraph/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("raw-data"),
            processed_dir: PathBuf::from("processed-data"),
            charts_dir: PathBuf::from("charts"),
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            low_volume_threshold: DEFAULT_LOW_VOLUME_THRESHOLD,
        }
    }
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            width: 2000,
            height: 600,
            font_family: "sans-serif".to_string(),
            background_color: "#ffffff".to_string(),
            platform_colors: PlatformColors::default(),
            diverging_palette: ["#2c3071", "#225182", "#1f708a", "#42928e", "#5ea990", "#a1cb90"]
                .map(String::from)
                .to_vec(),
            qualitative_palette: [
                "#0fb5ae", "#4046ca", "#f68511", "#de3d82", "#7e84fa", "#72e06a", "#147af3",
                "#7326d3", "#e8c600", "#cb5d00", "#008f5d", "#bce931",
            ]
            .map(String::from)
            .to_vec(),
            tick_every: 20,
            legend_range: 100,
        }
    }
}

impl Default for PlatformColors {
    fn default() -> Self {
        Self {
            linux: "#d24413".to_string(),
            windows: "#0072cb".to_string(),
            mac: "#06cb98".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}
