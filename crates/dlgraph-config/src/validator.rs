//! Runtime validation of loaded configuration.

use crate::schema::Config;
use dlgraph_common::{DlGraphError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// `#rrggbb`, case-insensitive.
pub static HEX_COLOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid colour regex"));

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration, reporting the first offending field.
    pub fn validate(config: &Config) -> Result<()> {
        for (field, value) in [
            ("sources.releases_url", &config.sources.releases_url),
            ("sources.themes_url", &config.sources.themes_url),
            ("sources.plugins_url", &config.sources.plugins_url),
        ] {
            Self::validate_url(field, value)?;
        }

        if config.http.timeout_secs == 0 {
            return Err(DlGraphError::validation_field(
                "HTTP timeout must be greater than 0",
                "http.timeout_secs",
            ));
        }
        if config.http.user_agent.trim().is_empty() {
            return Err(DlGraphError::validation_field(
                "User agent cannot be empty",
                "http.user_agent",
            ));
        }

        let charts = &config.charts;
        if !(100..=10_000).contains(&charts.width) || !(100..=10_000).contains(&charts.height) {
            return Err(DlGraphError::validation_field(
                format!(
                    "Chart size {}x{} must be between 100 and 10000 pixels",
                    charts.width, charts.height
                ),
                "charts.width",
            ));
        }
        if charts.tick_every == 0 {
            return Err(DlGraphError::validation_field(
                "Tick spacing must be greater than 0",
                "charts.tick_every",
            ));
        }
        if charts.legend_range == 0 {
            return Err(DlGraphError::validation_field(
                "Legend range must be greater than 0",
                "charts.legend_range",
            ));
        }

        Self::validate_color("charts.background_color", &charts.background_color)?;
        Self::validate_color("charts.platform_colors.linux", &charts.platform_colors.linux)?;
        Self::validate_color("charts.platform_colors.windows", &charts.platform_colors.windows)?;
        Self::validate_color("charts.platform_colors.mac", &charts.platform_colors.mac)?;
        Self::validate_palette("charts.diverging_palette", &charts.diverging_palette)?;
        Self::validate_palette("charts.qualitative_palette", &charts.qualitative_palette)?;

        Ok(())
    }

    fn validate_url(field: &str, value: &str) -> Result<()> {
        let url = url::Url::parse(value).map_err(|e| {
            DlGraphError::validation_field(format!("'{value}' is not a valid URL: {e}"), field)
        })?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(DlGraphError::validation_field(
                format!("unsupported URL scheme '{scheme}'"),
                field,
            )),
        }
    }

    fn validate_color(field: &str, value: &str) -> Result<()> {
        if HEX_COLOR_REGEX.is_match(value) {
            Ok(())
        } else {
            Err(DlGraphError::validation_field(
                format!("'{value}' is not a #rrggbb colour"),
                field,
            ))
        }
    }

    fn validate_palette(field: &str, palette: &[String]) -> Result<()> {
        if palette.is_empty() {
            return Err(DlGraphError::validation_field("Palette cannot be empty", field));
        }
        palette
            .iter()
            .try_for_each(|color| Self::validate_color(field, color))
    }
}

impl Config {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        ConfigValidator::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_invalid_url() {
        let mut config = Config::default();
        config.sources.themes_url = "not a url".to_string();

        let error = config.validate().unwrap_err();
        assert!(matches!(
            error,
            DlGraphError::Validation { field: Some(ref f), .. } if f == "sources.themes_url"
        ));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = Config::default();
        config.sources.releases_url = "ftp://example.com/releases".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_colors_and_empty_palettes() {
        let mut config = Config::default();
        config.charts.platform_colors.mac = "green".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.charts.qualitative_palette.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.charts.diverging_palette.push("#12345".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout_and_tiny_charts() {
        let mut config = Config::default();
        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.charts.height = 10;
        assert!(config.validate().is_err());
    }
}
