//! Common type definitions for domain modeling.

use crate::error::{DlGraphError, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating system a release asset is built for.
///
/// The declaration order is alphabetical so that the derived `Ord` matches
/// sorting by platform name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Linux packages (AppImage, deb, snap, tarballs, ...)
    Linux,
    /// macOS disk images
    Mac,
    /// Windows installers
    Windows,
}

impl Platform {
    /// All platforms in the order they are stacked in release charts.
    pub const STACK_ORDER: [Platform; 3] = [Platform::Linux, Platform::Windows, Platform::Mac];

    /// Lowercase name used in snapshot files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Mac => "mac",
            Self::Windows => "windows",
        }
    }

    /// Human readable name used in chart legends.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::Mac => "MacOS",
            Self::Windows => "Windows",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A statistics subject, one per data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    /// Application releases with per-asset download counts
    Releases,
    /// Community themes
    Themes,
    /// Community plugins
    Plugins,
}

impl Subject {
    /// Lowercase name, also the prefix of every snapshot file of this subject.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Releases => "releases",
            Self::Themes => "themes",
            Self::Plugins => "plugins",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = DlGraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "releases" => Ok(Self::Releases),
            "themes" => Ok(Self::Themes),
            "plugins" => Ok(Self::Plugins),
            other => Err(DlGraphError::validation(format!("unknown subject '{other}'"))),
        }
    }
}

/// Timestamp embedded in snapshot file names, e.g. `2024-03-01T09-15-00`.
///
/// The format is zero-padded and fixed width, so the textual order of two
/// timestamps equals their chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotTimestamp(NaiveDateTime);

impl SnapshotTimestamp {
    /// `strftime` format used in file names.
    pub const FORMAT: &'static str = "%Y-%m-%dT%H-%M-%S";

    /// Current local time, truncated to whole seconds.
    pub fn now() -> Self {
        Self::from_local(Local::now())
    }

    /// Timestamp of a local date-time, truncated to whole seconds.
    pub fn from_local(datetime: DateTime<Local>) -> Self {
        let naive = datetime.naive_local();
        Self(naive.with_nanosecond(0).unwrap_or(naive))
    }

    /// Midnight of the given day.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.and_time(NaiveTime::MIN))
    }

    /// Parses the file name form.
    pub fn parse(s: &str) -> Result<Self> {
        NaiveDateTime::parse_from_str(s, Self::FORMAT)
            .map(Self)
            .map_err(|e| DlGraphError::format(format!("invalid snapshot timestamp '{s}': {e}")))
    }

    /// Calendar day of the timestamp.
    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }
}

impl fmt::Display for SnapshotTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}
