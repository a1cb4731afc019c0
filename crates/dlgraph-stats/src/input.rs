//! Loading previously downloaded documents from disk.

use chrono::{DateTime, Local};
use dlgraph_common::{date_in_file_name, DlGraphError, Result, SnapshotTimestamp};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, instrument};

/// Reads a JSON document and the timestamp its snapshot should carry.
///
/// A date in the file name (`themes-2023-06-01.json`, `releases_20230601.json`)
/// wins and yields midnight of that day; otherwise the file's modification
/// time is used.
#[instrument]
pub fn read_provided_file(path: &Path) -> Result<(Value, SnapshotTimestamp)> {
    if !path.is_file() {
        return Err(DlGraphError::MissingFile(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&content)?;

    let timestamp = match date_in_file_name(path) {
        Some(date) => SnapshotTimestamp::from_date(date),
        None => {
            let modified = fs::metadata(path)?.modified()?;
            SnapshotTimestamp::from_local(DateTime::<Local>::from(modified))
        }
    };

    debug!(timestamp = %timestamp, "Read provided file");
    Ok((document, timestamp))
}
