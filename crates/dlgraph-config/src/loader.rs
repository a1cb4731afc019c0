//! Configuration loading utilities

use crate::Config;
use dlgraph_common::{DlGraphError, Result as DlGraphResult};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_VAR: &str = "DLGRAPH_CONFIG_PATH";

/// Files looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILES: [&str; 3] = ["dlgraph.yaml", "dlgraph.yml", "dlgraph.toml"];

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file {}: {source}", .path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        var: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for DlGraphError {
    fn from(err: ConfigError) -> Self {
        let message = err.to_string();
        DlGraphError::config_with_source(message, err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML or TOML file, chosen by extension.
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("toml"));

        let config = if is_toml {
            toml::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        Ok(config)
    }

    /// Load configuration from an explicit path, the environment, a default
    /// file in the working directory, or built-in defaults, in that order.
    ///
    /// Environment overrides are applied and the result is validated.
    pub fn load(explicit: Option<&Path>) -> DlGraphResult<Config> {
        let source = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_PATH_VAR).map(PathBuf::from))
            .or_else(|| {
                DEFAULT_CONFIG_FILES
                    .iter()
                    .map(PathBuf::from)
                    .find(|candidate| candidate.exists())
            });

        let mut config = match source {
            Some(path) => {
                info!(path = %path.display(), "Loading configuration file");
                Self::load_config(&path)?
            }
            None => {
                debug!("No configuration file found, using defaults");
                Config::default()
            }
        };

        Self::apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file, with overrides and validation
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> DlGraphResult<Config> {
        Self::load(Some(path.as_ref()))
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides_from(config, |var| env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DLGRAPH_RELEASES_URL") {
            config.sources.releases_url = url;
        }
        if let Some(url) = lookup("DLGRAPH_THEMES_URL") {
            config.sources.themes_url = url;
        }
        if let Some(url) = lookup("DLGRAPH_PLUGINS_URL") {
            config.sources.plugins_url = url;
        }

        if let Some(timeout) = lookup("DLGRAPH_HTTP_TIMEOUT") {
            config.http.timeout_secs = parse_var("DLGRAPH_HTTP_TIMEOUT", &timeout)?;
        }
        if let Some(user_agent) = lookup("DLGRAPH_USER_AGENT") {
            config.http.user_agent = user_agent;
        }

        if let Some(dir) = lookup("DLGRAPH_RAW_DIR") {
            config.storage.raw_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("DLGRAPH_PROCESSED_DIR") {
            config.storage.processed_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("DLGRAPH_CHARTS_DIR") {
            config.storage.charts_dir = PathBuf::from(dir);
        }

        if let Some(threshold) = lookup("DLGRAPH_LOW_VOLUME_THRESHOLD") {
            config.aggregation.low_volume_threshold =
                parse_var("DLGRAPH_LOW_VOLUME_THRESHOLD", &threshold)?;
        }

        if let Some(level) = lookup("DLGRAPH_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(())
    }
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::EnvParseError {
        var: var.to_string(),
        source: Box::new(e),
    })
}
