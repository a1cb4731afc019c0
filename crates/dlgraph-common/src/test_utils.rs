//! Test utilities and shared fixtures.
//!
//! Enabled with the `testing` feature so that the other workspace crates can
//! use the same JSON fixtures in their integration tests.

use serde_json::{json, Value};
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize logging for tests once per test binary.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Assert that two floating point numbers are approximately equal within a tolerance.
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    let diff = (left - right).abs();
    assert!(
        diff <= tolerance,
        "assertion failed: `{left}` is not approximately equal to `{right}` (tolerance: {tolerance}, diff: {diff})"
    );
}

/// JSON fixtures shaped like the live endpoints.
pub mod fixtures {
    use super::*;

    /// One release asset as served by the releases endpoint.
    pub fn asset(file_name: &str, version: &str, downloads: u64) -> Value {
        json!({
            "name": file_name,
            "browser_download_url": format!(
                "https://github.com/obsidianmd/obsidian-releases/releases/download/v{version}/{file_name}"
            ),
            "download_count": downloads,
        })
    }

    /// A release with one asset per platform plus the `asar.gz` update bundle.
    pub fn release(version: &str, created_at: &str, linux: u64, windows: u64, mac: u64) -> Value {
        json!({
            "name": version,
            "tag_name": format!("v{version}"),
            "created_at": created_at,
            "assets": [
                asset(&format!("Obsidian-{version}.AppImage"), version, linux),
                asset(&format!("Obsidian.{version}.exe"), version, windows),
                asset(&format!("Obsidian-{version}-universal.dmg"), version, mac),
                asset(&format!("obsidian-{version}.asar.gz"), version, 123_456),
            ],
        })
    }

    /// The two-release scenario: `0.12.4` totals 9000, `0.13.0` totals 14000.
    pub fn two_releases() -> Value {
        json!([
            release("0.12.4", "2021-05-01T10:00:00Z", 5000, 3000, 1000),
            release("0.13.0", "2021-06-15T12:30:00Z", 8000, 4000, 2000),
        ])
    }

    /// Theme or plugin statistics keyed by entity name, in the given order.
    pub fn entity_stats(entries: &[(&str, u64)]) -> Value {
        let map = entries
            .iter()
            .enumerate()
            .map(|(id, (name, downloads))| {
                (
                    (*name).to_string(),
                    json!({ "download": downloads, "id": format!("entity-{id}") }),
                )
            })
            .collect::<serde_json::Map<String, Value>>();
        Value::Object(map)
    }
}
