//! Integration tests for dlgraph-config crate.
//!
//! These tests load real files from a temporary directory.

use dlgraph_common::test_utils::init_test_logging;
use dlgraph_common::{LogFormat, Subject};
use dlgraph_config::{Config, ConfigLoader, DEFAULT_LOW_VOLUME_THRESHOLD};
use std::fs;
use std::path::PathBuf;

#[test]
fn test_partial_yaml_keeps_defaults() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dlgraph.yaml");
    fs::write(
        &path,
        r#"
sources:
  themes_url: "http://127.0.0.1:8080/stats/theme"
storage:
  processed_dir: "data/processed"
charts:
  width: 1200
logging:
  format: json
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_config(&path).unwrap();

    assert_eq!(config.sources.url_for(Subject::Themes), "http://127.0.0.1:8080/stats/theme");
    assert_eq!(config.sources.releases_url, Config::default().sources.releases_url);
    assert_eq!(config.storage.processed_dir, PathBuf::from("data/processed"));
    assert_eq!(config.storage.raw_dir, PathBuf::from("raw-data"));
    assert_eq!(config.charts.width, 1200);
    assert_eq!(config.charts.height, 600);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.aggregation.low_volume_threshold, DEFAULT_LOW_VOLUME_THRESHOLD);
    assert!(config.validate().is_ok());
}

#[test]
fn test_toml_file_is_parsed_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dlgraph.toml");
    fs::write(
        &path,
        r#"
[aggregation]
low_volume_threshold = 2500

[http]
timeout_secs = 10
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_config(&path).unwrap();
    assert_eq!(config.aggregation.low_volume_threshold, 2500);
    assert_eq!(config.http.timeout_secs, 10);
    assert_eq!(config.http.user_agent, Config::default().http.user_agent);
}

#[test]
fn test_invalid_file_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yml");
    fs::write(&path, "charts:\n  background_color: white\n").unwrap();

    assert!(ConfigLoader::load_from_file(&path).is_err());
}

#[test]
fn test_malformed_yaml_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dlgraph.yaml");
    fs::write(&path, "charts: [unclosed").unwrap();

    let error = ConfigLoader::load_config(&path).unwrap_err();
    assert!(error.to_string().contains("YAML"));
}
