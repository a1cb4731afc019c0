//! Shared utility functions for file naming and dates.

use crate::types::SnapshotTimestamp;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// A date anywhere in a file name: four digits, two digits, two digits with
/// at most one arbitrary separator between the groups.
static FILE_NAME_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}).?(\d{2}).?(\d{2})").expect("valid date regex"));

/// Inserts `_<timestamp>` before the extension of `base`.
///
/// Everything after the first dot of the file name counts as the extension,
/// so `raw-data/releases.json` becomes `raw-data/releases_<ts>.json` and
/// `stats.tar.gz` becomes `stats_<ts>.tar.gz`.
pub fn timestamped_path(base: &Path, timestamp: SnapshotTimestamp) -> PathBuf {
    let file_name = base
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stamped = match file_name.split_once('.') {
        Some((stem, extension)) => format!("{stem}_{timestamp}.{extension}"),
        None => format!("{file_name}_{timestamp}"),
    };

    base.with_file_name(stamped)
}

/// Finds the first date encoded in a path's file name, if any.
pub fn date_in_file_name(path: &Path) -> Option<NaiveDate> {
    let file_name = path.file_name()?.to_string_lossy();

    FILE_NAME_DATE.captures_iter(&file_name).find_map(|caps| {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}
