//! Turning the releases document into one row per downloadable asset.

use chrono::NaiveDateTime;
use dlgraph_common::{DlGraphError, Platform, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, trace};

/// Version number embedded in an asset file name. Separators match any
/// character: `Obsidian.1.4.16.exe`, `obsidian_1.4.16_amd64.deb`.
static VERSION_IN_FILE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+.\d+.\d+").expect("valid version regex"));

/// `created_at` format of the releases endpoint.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A release as served by the releases endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Release name, the version number
    pub name: String,
    /// Creation time, `YYYY-MM-DDTHH:MM:SSZ`
    pub created_at: String,
    /// Downloadable files
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A downloadable file of a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    /// Public download URL, the last path segment is the file name
    pub browser_download_url: String,
    /// Number of downloads so far
    pub download_count: u64,
}

/// One asset of one release, the row type of release snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRow {
    /// Zero-padded version, see [`normalize_version`]
    pub version: String,
    /// Platform inferred from the file type
    pub platform: Platform,
    /// Downloads of this asset
    pub downloads: u64,
    /// File name suffix after the version number, e.g. `universal.dmg`
    pub file_type: String,
    /// Release creation time in seconds since the epoch
    pub created_at: i64,
}

/// Pads every version segment except a bare `0` to two digits, so that
/// `0.12.4` becomes `0.12.04` and sorts after `0.9.0`.
///
/// Applying it twice gives the same result as applying it once.
pub fn normalize_version(version: &str) -> Result<String> {
    if version.is_empty() {
        return Err(DlGraphError::format("empty release version"));
    }

    let segments = version
        .split('.')
        .map(|segment| match segment {
            "" => Err(DlGraphError::format(format!(
                "release version '{version}' has an empty segment"
            ))),
            "0" => Ok("0".to_string()),
            other => Ok(format!("{other:0>2}")),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(segments.join("."))
}

/// Parses `2022-07-26T18:40:50Z` into seconds since the epoch (UTC).
pub fn parse_created_at(created_at: &str) -> Result<i64> {
    NaiveDateTime::parse_from_str(created_at, CREATED_AT_FORMAT)
        .map(|datetime| datetime.and_utc().timestamp())
        .map_err(|e| DlGraphError::format(format!("invalid created_at '{created_at}': {e}")))
}

/// File type of an asset: whatever follows the version number and one
/// separator in the file name of `url`.
pub fn asset_file_type(url: &str) -> Result<String> {
    let file_name = url.rsplit('/').next().unwrap_or(url);
    let found = VERSION_IN_FILE_NAME.find(file_name).ok_or_else(|| {
        DlGraphError::format(format!("no version number in asset file name '{file_name}'"))
    })?;

    let mut rest = file_name[found.end()..].chars();
    rest.next();
    Ok(rest.as_str().to_string())
}

/// Platform of a file type, `None` for the `asar.gz` update bundle which is
/// not a download.
pub fn classify(file_type: &str) -> Option<Platform> {
    if file_type.ends_with("asar.gz") {
        None
    } else if file_type.ends_with("dmg") {
        Some(Platform::Mac)
    } else if file_type.ends_with("exe") {
        Some(Platform::Windows)
    } else {
        Some(Platform::Linux)
    }
}

/// Flattens a releases document into asset rows, in document order.
#[instrument(skip_all)]
pub fn normalize_releases(document: &Value) -> Result<Vec<AssetRow>> {
    let releases = Vec::<Release>::deserialize(document)
        .map_err(|e| DlGraphError::format(format!("unexpected releases document: {e}")))?;

    let mut rows = Vec::new();
    for release in &releases {
        let version = normalize_version(&release.name)?;
        let created_at = parse_created_at(&release.created_at)?;

        for asset in &release.assets {
            let file_type = asset_file_type(&asset.browser_download_url)?;
            let Some(platform) = classify(&file_type) else {
                trace!(version = %version, "Skipping {}", file_type);
                continue;
            };

            rows.push(AssetRow {
                version: version.clone(),
                platform,
                downloads: asset.download_count,
                file_type,
                created_at,
            });
        }
    }

    debug!(releases = releases.len(), rows = rows.len(), "Normalized releases");
    Ok(rows)
}
