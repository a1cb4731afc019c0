//! Flat-file snapshot store.
//!
//! Snapshots are CSV files named `<subject>_<YYYY-MM-DDTHH-MM-SS>.csv` in a
//! single directory. They are written once and never modified; derived
//! tables live next to them under names that never match that pattern.

use chrono::NaiveDate;
use dlgraph_common::{timestamped_path, DlGraphError, Result, SnapshotTimestamp, Subject};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// `<subject>_<timestamp>.csv`
static SNAPSHOT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z]+)_(\d{4}-\d{2}-\d{2}T\d{2}-\d{2}-\d{2})\.csv$")
        .expect("valid snapshot name regex")
});

/// A snapshot file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    /// Full path of the file
    pub path: PathBuf,
    /// Subject the snapshot belongs to
    pub subject: Subject,
    /// Timestamp parsed from the file name
    pub timestamp: SnapshotTimestamp,
}

impl SnapshotFile {
    /// Calendar day the snapshot was taken on.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Snapshots used to compute download differences over time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHistory {
    /// The latest snapshot of each earlier day, oldest first.
    pub days: Vec<SnapshotFile>,
    /// Day of the current table, which closes the last interval.
    pub current_date: NaiveDate,
}

/// A table whose columns are only known at runtime.
pub trait CsvRecords {
    /// Column names.
    fn header(&self) -> Vec<String>;
    /// One record per row, each as long as the header.
    fn records(&self) -> Vec<Vec<String>>;
}

/// Writes a [`CsvRecords`] table, header first.
pub fn write_records<W: Write, T: CsvRecords + ?Sized>(writer: W, table: &T) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(table.header())?;
    for record in table.records() {
        csv_writer.write_record(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Directory of timestamped CSV snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Creates a store rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the snapshots.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `rows` as a new snapshot named after `base_name` and `timestamp`.
    ///
    /// `themes.csv` with timestamp `2024-05-01T10-00-00` becomes
    /// `themes_2024-05-01T10-00-00.csv`. An existing file is never replaced.
    pub fn save<R: Serialize>(
        &self,
        rows: &[R],
        base_name: &str,
        timestamp: SnapshotTimestamp,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = timestamped_path(&self.dir.join(base_name), timestamp);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => DlGraphError::SnapshotExists(path.clone()),
                _ => DlGraphError::Io(e),
            })?;

        write_rows(file, rows)?;
        info!(path = %path.display(), rows = rows.len(), "Saved snapshot");
        Ok(path)
    }

    /// All snapshots of `subject`, oldest first.
    ///
    /// Ties on the timestamp are ordered by file name. A store directory that
    /// does not exist yet holds no snapshots.
    pub fn list(&self, subject: Subject) -> Result<Vec<SnapshotFile>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(dir = %self.dir.display(), "Snapshot directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut snapshots = Vec::new();

        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some(caps) = SNAPSHOT_NAME.captures(file_name) else {
                continue;
            };
            if caps[1].parse::<Subject>().ok() != Some(subject) {
                continue;
            }
            // The pattern admits impossible dates such as month 13.
            let Ok(timestamp) = SnapshotTimestamp::parse(&caps[2]) else {
                debug!("Ignoring {} with an invalid timestamp", file_name);
                continue;
            };

            snapshots.push(SnapshotFile {
                path: entry.path(),
                subject,
                timestamp,
            });
        }

        snapshots.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.path.file_name().cmp(&b.path.file_name()))
        });

        debug!(subject = %subject, count = snapshots.len(), "Listed snapshots");
        Ok(snapshots)
    }

    /// The newest snapshot of `subject`.
    pub fn latest(&self, subject: Subject) -> Result<SnapshotFile> {
        self.list(subject)?
            .pop()
            .ok_or_else(|| DlGraphError::no_snapshot(subject.as_str(), &self.dir))
    }

    /// Reads the rows of a snapshot.
    pub fn load<R: DeserializeOwned>(&self, file: &SnapshotFile) -> Result<Vec<R>> {
        read_rows(&file.path)
    }

    /// Reads the rows of the newest snapshot of `subject`.
    pub fn load_latest<R: DeserializeOwned>(
        &self,
        subject: Subject,
    ) -> Result<(SnapshotFile, Vec<R>)> {
        let file = self.latest(subject)?;
        info!(path = %file.path.display(), "Loading latest snapshot");
        let rows = self.load(&file)?;
        Ok((file, rows))
    }

    /// Writes a derived table, replacing any previous version.
    pub fn save_derived<R: Serialize>(&self, file_name: &str, rows: &[R]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        write_rows(File::create(&path)?, rows)?;
        info!(path = %path.display(), "Saved derived table");
        Ok(path)
    }

    /// Writes a derived table with a runtime header, replacing any previous
    /// version.
    pub fn save_derived_records<T: CsvRecords + ?Sized>(
        &self,
        file_name: &str,
        table: &T,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        write_records(File::create(&path)?, table)?;
        info!(path = %path.display(), "Saved derived table");
        Ok(path)
    }

    /// Snapshots to difference a table taken at `current` against.
    ///
    /// Only snapshots strictly older than `current` count, so the snapshot
    /// holding the current table itself is left out. Of those the latest per
    /// calendar day is kept. The last interval closes on the day of `current`.
    pub fn history(&self, subject: Subject, current: SnapshotTimestamp) -> Result<SnapshotHistory> {
        let snapshots = self.list(subject)?;
        if snapshots.is_empty() {
            return Err(DlGraphError::no_snapshot(subject.as_str(), &self.dir));
        }
        let found = snapshots.len();

        let mut days: Vec<SnapshotFile> = Vec::new();
        for snapshot in snapshots.into_iter().filter(|s| s.timestamp < current) {
            match days.last_mut() {
                Some(last) if last.date() == snapshot.date() => *last = snapshot,
                _ => days.push(snapshot),
            }
        }

        if days.is_empty() {
            return Err(DlGraphError::InsufficientHistory {
                subject: subject.as_str().to_string(),
                found,
            });
        }

        debug!(subject = %subject, days = days.len(), "Resolved snapshot history");
        Ok(SnapshotHistory {
            days,
            current_date: current.date(),
        })
    }
}

fn write_rows<W: Write, R: Serialize>(writer: W, rows: &[R]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn read_rows<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<R>, csv::Error>>()
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        name: String,
        downloads: u64,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "a".into(), downloads: 1 },
            Row { name: "b".into(), downloads: 2 },
        ]
    }

    fn ts(s: &str) -> SnapshotTimestamp {
        SnapshotTimestamp::parse(s).unwrap()
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "name,downloads\n").unwrap();
    }

    #[test]
    fn test_save_and_load_latest() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("processed"));

        let path = store.save(&rows(), "themes.csv", ts("2024-01-02T03-04-05")).unwrap();
        assert!(path.ends_with("themes_2024-01-02T03-04-05.csv"));

        let (file, loaded) = store.load_latest::<Row>(Subject::Themes).unwrap();
        assert_eq!(file.path, path);
        assert_eq!(loaded, rows());
    }

    #[test]
    fn test_save_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        store.save(&rows(), "themes.csv", ts("2024-01-02T03-04-05")).unwrap();
        let error = store
            .save(&rows()[..1], "themes.csv", ts("2024-01-02T03-04-05"))
            .unwrap_err();
        assert!(matches!(error, DlGraphError::SnapshotExists(_)));

        let (_, loaded) = store.load_latest::<Row>(Subject::Themes).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_list_filters_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "themes_2024-03-01T00-00-00.csv",
            "themes_2023-12-31T23-59-59.csv",
            "themes_diff.csv",
            "themes_2024-13-01T00-00-00.csv",
            "plugins_2024-01-01T00-00-00.csv",
            "themes_2024-01-01T00-00-00.csv.bak",
            "themes_2024-01-01.csv",
        ] {
            touch(dir.path(), name);
        }

        let store = SnapshotStore::new(dir.path());
        let names: Vec<String> = store
            .list(Subject::Themes)
            .unwrap()
            .iter()
            .map(|s| s.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            names,
            ["themes_2023-12-31T23-59-59.csv", "themes_2024-03-01T00-00-00.csv"]
        );
    }

    #[test]
    fn test_missing_directory_has_no_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nope"));

        assert!(store.list(Subject::Releases).unwrap().is_empty());
        let error = store.latest(Subject::Releases).unwrap_err();
        assert!(error.is_missing_snapshot());
    }

    #[test]
    fn test_history_keeps_latest_per_day_and_excludes_current() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "plugins_2024-01-01T08-00-00.csv",
            "plugins_2024-01-01T20-00-00.csv",
            "plugins_2024-01-03T09-00-00.csv",
            "plugins_2024-01-05T09-00-00.csv",
        ] {
            touch(dir.path(), name);
        }

        let history = SnapshotStore::new(dir.path())
            .history(Subject::Plugins, ts("2024-01-05T09-00-00"))
            .unwrap();
        let stamps: Vec<String> = history.days.iter().map(|s| s.timestamp.to_string()).collect();
        assert_eq!(stamps, ["2024-01-01T20-00-00", "2024-01-03T09-00-00"]);
        assert_eq!(history.current_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn test_history_of_unsaved_table_keeps_every_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "themes_2024-01-01T08-00-00.csv");
        touch(dir.path(), "themes_2024-01-02T08-00-00.csv");

        let history = SnapshotStore::new(dir.path())
            .history(Subject::Themes, ts("2024-01-04T12-00-00"))
            .unwrap();
        let dates: Vec<NaiveDate> = history.days.iter().map(SnapshotFile::date).collect();
        assert_eq!(
            dates,
            [
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            ]
        );
        assert_eq!(history.current_date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    }

    #[test]
    fn test_history_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let current = ts("2024-01-01T08-00-00");
        assert!(store.history(Subject::Themes, current).unwrap_err().is_missing_snapshot());

        touch(dir.path(), "themes_2024-01-01T08-00-00.csv");
        assert!(matches!(
            store.history(Subject::Themes, current).unwrap_err(),
            DlGraphError::InsufficientHistory { found: 1, .. }
        ));
    }

    #[test]
    fn test_save_derived_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());

        store.save_derived("releases_versions.csv", &rows()).unwrap();
        let path = store.save_derived("releases_versions.csv", &rows()[..1]).unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), "name,downloads\na,1\n");
        assert!(store.list(Subject::Releases).unwrap().is_empty());
    }
}
