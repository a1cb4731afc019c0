//! # dlgraph stats
//!
//! Fetching, snapshotting and aggregation of download statistics.
//!
//! Raw documents come from the [`fetcher`] or from disk via [`input`], are
//! flattened by [`releases`] or [`entities`], persisted by the [`snapshot`]
//! store and aggregated into chart-ready views by [`aggregate`] and
//! [`difference`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod difference;
pub mod entities;
pub mod fetcher;
pub mod input;
pub mod releases;
pub mod snapshot;

pub use aggregate::{PercentBar, ReleaseTable, VersionBar, VersionRow};
pub use difference::{load_history, DatedSnapshot, Interval, IntervalRow, IntervalTable};
pub use entities::{parse_entity_stats, EntityRow, EntityTable};
pub use fetcher::DataFetcher;
pub use input::read_provided_file;
pub use releases::{normalize_releases, normalize_version, AssetRow};
pub use snapshot::{CsvRecords, SnapshotFile, SnapshotHistory, SnapshotStore};
