//! Aggregation of release assets into per-version, per-platform totals and
//! the views rendered from them.

use crate::releases::AssetRow;
use dlgraph_common::{DlGraphError, Platform, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Downloads of one version on one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRow {
    /// Zero-padded version
    pub version: String,
    /// Platform
    pub platform: Platform,
    /// Summed downloads of all assets of this version and platform
    pub downloads: u64,
    /// Earliest creation time among the merged assets, epoch seconds
    pub created_at: i64,
}

/// One stacked bar of a release chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBar {
    /// Version label
    pub version: String,
    /// Linux downloads
    pub linux: u64,
    /// Windows downloads
    pub windows: u64,
    /// macOS downloads
    pub mac: u64,
}

impl VersionBar {
    /// Downloads on `platform`.
    pub fn downloads(&self, platform: Platform) -> u64 {
        match platform {
            Platform::Linux => self.linux,
            Platform::Windows => self.windows,
            Platform::Mac => self.mac,
        }
    }

    /// Downloads across all platforms.
    pub fn total(&self) -> u64 {
        self.linux + self.windows + self.mac
    }
}

/// A [`VersionBar`] expressed as percentages of its total.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentBar {
    /// Version label
    pub version: String,
    /// Linux share in percent
    pub linux: f64,
    /// Windows share in percent
    pub windows: f64,
    /// macOS share in percent
    pub mac: f64,
}

impl PercentBar {
    /// Share of `platform` in percent.
    pub fn share(&self, platform: Platform) -> f64 {
        match platform {
            Platform::Linux => self.linux,
            Platform::Windows => self.windows,
            Platform::Mac => self.mac,
        }
    }
}

/// Collapses rows sharing a version and platform, summing their downloads.
///
/// The result is ordered by version, then platform name.
pub fn group_sum(rows: &[AssetRow]) -> Vec<VersionRow> {
    let mut groups: BTreeMap<(String, Platform), (u64, i64)> = BTreeMap::new();

    for row in rows {
        groups
            .entry((row.version.clone(), row.platform))
            .and_modify(|(downloads, created_at)| {
                *downloads += row.downloads;
                *created_at = (*created_at).min(row.created_at);
            })
            .or_insert((row.downloads, row.created_at));
    }

    groups
        .into_iter()
        .map(|((version, platform), (downloads, created_at))| VersionRow {
            version,
            platform,
            downloads,
            created_at,
        })
        .collect()
}

/// Drops every version whose downloads across all platforms do not exceed
/// `threshold`.
pub fn filter_low_volume(rows: Vec<VersionRow>, threshold: u64) -> Vec<VersionRow> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for row in &rows {
        *totals.entry(row.version.as_str()).or_default() += row.downloads;
    }

    let keep: Vec<String> = totals
        .into_iter()
        .filter(|(_, total)| *total > threshold)
        .map(|(version, _)| version.to_string())
        .collect();

    rows.into_iter()
        .filter(|row| keep.binary_search(&row.version).is_ok())
        .collect()
}

/// Adds a zero row for every platform a version has no assets for.
///
/// The result is ordered by version, then platform name, with exactly one
/// row per version and platform.
pub fn zero_fill(rows: Vec<VersionRow>) -> Vec<VersionRow> {
    let mut by_key: BTreeMap<(String, Platform), VersionRow> = BTreeMap::new();
    let mut created: BTreeMap<String, i64> = BTreeMap::new();

    for row in rows {
        created
            .entry(row.version.clone())
            .and_modify(|earliest| *earliest = (*earliest).min(row.created_at))
            .or_insert(row.created_at);
        by_key.insert((row.version.clone(), row.platform), row);
    }

    for (version, created_at) in created {
        for platform in Platform::STACK_ORDER {
            by_key
                .entry((version.clone(), platform))
                .or_insert_with(|| VersionRow {
                    version: version.clone(),
                    platform,
                    downloads: 0,
                    created_at,
                });
        }
    }

    by_key.into_values().collect()
}

/// Aggregated release downloads, three rows per version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseTable {
    rows: Vec<VersionRow>,
}

impl ReleaseTable {
    /// Aggregates asset rows, dropping versions at or below `threshold`.
    #[instrument(skip(assets), fields(assets = assets.len()))]
    pub fn from_assets(assets: &[AssetRow], threshold: u64) -> Self {
        let grouped = group_sum(assets);
        let grouped_count = grouped.len();
        let filtered = filter_low_volume(grouped, threshold);
        debug!(
            dropped = grouped_count - filtered.len(),
            "Filtered low-volume version rows"
        );

        let table = Self {
            rows: zero_fill(filtered),
        };
        info!(versions = table.version_count(), "Aggregated releases");
        table
    }

    /// Builds a table from already aggregated rows, filling in missing
    /// platforms.
    pub fn from_version_rows(rows: Vec<VersionRow>) -> Self {
        Self {
            rows: zero_fill(rows),
        }
    }

    /// Rows ordered by version, then platform name.
    pub fn rows(&self) -> &[VersionRow] {
        &self.rows
    }

    /// Number of versions in the table.
    pub fn version_count(&self) -> usize {
        self.rows.len() / Platform::STACK_ORDER.len()
    }

    /// Whether no version survived aggregation.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One bar per version in version order.
    pub fn chronological(&self) -> Vec<VersionBar> {
        bars_in_row_order(&self.rows)
    }

    /// One bar per version, most downloaded first, in the order of
    /// [`ReleaseTable::sorted_rows`]. Versions with equal totals keep their
    /// version order.
    pub fn sorted(&self) -> Vec<VersionBar> {
        bars_in_row_order(&self.sorted_rows())
    }

    /// Rows of the sorted view: by version total descending, then platform
    /// name descending.
    pub fn sorted_rows(&self) -> Vec<VersionRow> {
        let totals: BTreeMap<&str, u64> = self.chronological_totals();
        let mut rows = self.rows.clone();
        rows.sort_by_key(|row| {
            (
                Reverse(totals.get(row.version.as_str()).copied().unwrap_or(0)),
                Reverse(row.platform),
            )
        });
        rows
    }

    /// Per-platform shares of each version's downloads.
    ///
    /// A version without any downloads has no shares and is reported as
    /// [`DlGraphError::ZeroTotal`].
    pub fn normalized(&self) -> Result<Vec<PercentBar>> {
        self.chronological()
            .into_iter()
            .map(|bar| {
                let total = bar.total();
                if total == 0 {
                    return Err(DlGraphError::ZeroTotal {
                        version: bar.version,
                    });
                }

                let share = |downloads: u64| 100.0 * downloads as f64 / total as f64;
                Ok(PercentBar {
                    linux: share(bar.linux),
                    windows: share(bar.windows),
                    mac: share(bar.mac),
                    version: bar.version,
                })
            })
            .collect()
    }

    fn chronological_totals(&self) -> BTreeMap<&str, u64> {
        let mut totals = BTreeMap::new();
        for row in &self.rows {
            *totals.entry(row.version.as_str()).or_default() += row.downloads;
        }
        totals
    }
}

/// Merges rows into one bar per version, ordered by first appearance.
fn bars_in_row_order(rows: &[VersionRow]) -> Vec<VersionBar> {
    let mut bars: Vec<VersionBar> = Vec::new();

    for row in rows {
        let index = match bars.iter().position(|bar| bar.version == row.version) {
            Some(index) => index,
            None => {
                bars.push(VersionBar {
                    version: row.version.clone(),
                    linux: 0,
                    windows: 0,
                    mac: 0,
                });
                bars.len() - 1
            }
        };

        let bar = &mut bars[index];
        match row.platform {
            Platform::Linux => bar.linux = row.downloads,
            Platform::Windows => bar.windows = row.downloads,
            Platform::Mac => bar.mac = row.downloads,
        }
    }

    bars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::releases::normalize_releases;
    use dlgraph_common::test_utils::{assert_approx_eq, fixtures};

    fn asset(version: &str, platform: Platform, downloads: u64, created_at: i64) -> AssetRow {
        AssetRow {
            version: version.to_string(),
            platform,
            downloads,
            file_type: String::new(),
            created_at,
        }
    }

    #[test]
    fn test_group_sum_merges_duplicate_assets() {
        let rows = group_sum(&[
            asset("01.00.0", Platform::Linux, 100, 50),
            asset("01.00.0", Platform::Linux, 25, 40),
            asset("01.00.0", Platform::Mac, 7, 60),
        ]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].platform, Platform::Linux);
        assert_eq!(rows[0].downloads, 125);
        assert_eq!(rows[0].created_at, 40);
    }

    #[test]
    fn test_low_volume_filter_is_strict() {
        let rows = group_sum(&[
            asset("01.00.0", Platform::Linux, 9_999, 0),
            asset("01.01.0", Platform::Linux, 10_000, 0),
            asset("01.02.0", Platform::Linux, 10_001, 0),
            asset("01.03.0", Platform::Linux, 6_000, 0),
            asset("01.03.0", Platform::Windows, 4_001, 0),
        ]);

        let versions: Vec<String> = filter_low_volume(rows, 10_000)
            .into_iter()
            .map(|row| row.version)
            .collect();
        assert_eq!(versions, ["01.02.0", "01.03.0", "01.03.0"]);
    }

    #[test]
    fn test_zero_fill_adds_missing_platforms() {
        let rows = zero_fill(vec![VersionRow {
            version: "01.00.0".into(),
            platform: Platform::Windows,
            downloads: 11,
            created_at: 99,
        }]);

        assert_eq!(rows.len(), 3);
        let platforms: Vec<Platform> = rows.iter().map(|row| row.platform).collect();
        assert_eq!(platforms, [Platform::Linux, Platform::Mac, Platform::Windows]);
        assert!(rows.iter().all(|row| row.created_at == 99));
        assert_eq!(rows[0].downloads, 0);
    }

    #[test]
    fn test_two_release_scenario() {
        let assets = normalize_releases(&fixtures::two_releases()).unwrap();
        let table = ReleaseTable::from_assets(&assets, 10_000);

        assert_eq!(table.version_count(), 1);
        assert_eq!(
            table.chronological(),
            vec![VersionBar {
                version: "0.13.0".into(),
                linux: 8000,
                windows: 4000,
                mac: 2000,
            }]
        );

        let shares = table.normalized().unwrap();
        assert_approx_eq(shares[0].linux, 100.0 * 8000.0 / 14000.0, 1e-9);
        assert_approx_eq(shares[0].linux + shares[0].windows + shares[0].mac, 100.0, 1e-9);
    }

    #[test]
    fn test_sorted_views() {
        let table = ReleaseTable::from_assets(
            &[
                asset("01.00.0", Platform::Linux, 20, 0),
                asset("01.01.0", Platform::Linux, 50, 0),
                asset("01.01.0", Platform::Mac, 10, 0),
                asset("01.02.0", Platform::Windows, 20, 0),
            ],
            0,
        );

        let order: Vec<String> = table.sorted().into_iter().map(|bar| bar.version).collect();
        assert_eq!(order, ["01.01.0", "01.00.0", "01.02.0"]);

        let rows = table.sorted_rows();
        let head: Vec<(&str, Platform)> = rows
            .iter()
            .take(3)
            .map(|row| (row.version.as_str(), row.platform))
            .collect();
        assert_eq!(
            head,
            [
                ("01.01.0", Platform::Windows),
                ("01.01.0", Platform::Mac),
                ("01.01.0", Platform::Linux)
            ]
        );
    }

    #[test]
    fn test_normalized_zero_total() {
        let table = ReleaseTable::from_assets(&[asset("01.00.0", Platform::Linux, 0, 0)], 0);
        assert!(table.is_empty());

        let table = ReleaseTable::from_version_rows(vec![VersionRow {
            version: "01.00.0".into(),
            platform: Platform::Mac,
            downloads: 0,
            created_at: 0,
        }]);
        assert!(matches!(
            table.normalized().unwrap_err(),
            DlGraphError::ZeroTotal { ref version } if version == "01.00.0"
        ));
    }
}
