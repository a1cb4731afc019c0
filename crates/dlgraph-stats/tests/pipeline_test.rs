//! Snapshot round trips and the release and difference pipelines end to end.

use dlgraph_common::test_utils::fixtures;
use dlgraph_common::{Platform, SnapshotTimestamp, Subject};
use dlgraph_stats::{
    load_history, normalize_releases, parse_entity_stats, AssetRow, EntityRow, EntityTable,
    IntervalTable, ReleaseTable, SnapshotStore, VersionRow,
};
use std::fs;

fn ts(s: &str) -> SnapshotTimestamp {
    SnapshotTimestamp::parse(s).unwrap()
}

#[test]
fn test_release_snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());

    let assets = normalize_releases(&fixtures::two_releases()).unwrap();
    store.save(&assets, "releases.csv", ts("2021-07-01T00-00-00")).unwrap();

    let (file, loaded) = store.load_latest::<AssetRow>(Subject::Releases).unwrap();
    assert_eq!(file.timestamp, ts("2021-07-01T00-00-00"));
    assert_eq!(loaded, assets);

    let header = fs::read_to_string(&file.path).unwrap();
    assert!(header.starts_with("version,platform,downloads,file_type,created_at\n0.12.04,linux,5000,AppImage,"));
}

#[test]
fn test_two_release_scenario_from_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());

    let assets = normalize_releases(&fixtures::two_releases()).unwrap();
    store.save(&assets, "releases.csv", ts("2021-07-01T00-00-00")).unwrap();
    let (_, loaded) = store.load_latest::<AssetRow>(Subject::Releases).unwrap();

    let table = ReleaseTable::from_assets(&loaded, 10_000);
    let rows: Vec<(&str, Platform, u64)> = table
        .rows()
        .iter()
        .map(|row| (row.version.as_str(), row.platform, row.downloads))
        .collect();
    assert_eq!(
        rows,
        [
            ("0.13.0", Platform::Linux, 8000),
            ("0.13.0", Platform::Mac, 2000),
            ("0.13.0", Platform::Windows, 4000),
        ]
    );

    let path = store.save_derived("releases_versions.csv", table.rows()).unwrap();
    let mut reader = csv::Reader::from_path(&path).unwrap();
    let reread: Vec<VersionRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(reread, table.rows());
}

#[test]
fn test_difference_from_stored_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());

    let days = [
        ("2024-01-01T08-00-00", vec![("Minimal", 90), ("Atom", 10)]),
        ("2024-01-01T21-00-00", vec![("Minimal", 100), ("Atom", 12)]),
        ("2024-01-02T09-00-00", vec![("Minimal", 150), ("Atom", 20), ("Nord", 1)]),
        ("2024-01-04T09-00-00", vec![("Minimal", 260), ("Atom", 25), ("Nord", 9)]),
    ];
    for (stamp, entries) in &days {
        let rows = parse_entity_stats(&fixtures::entity_stats(entries)).unwrap();
        let table = EntityTable::from_rows(rows);
        store.save(table.rows(), "themes.csv", ts(stamp)).unwrap();
    }

    let (latest, current_rows) = store.load_latest::<EntityRow>(Subject::Themes).unwrap();
    let (history, current_date) = load_history(&store, Subject::Themes, latest.timestamp).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(current_date.to_string(), "2024-01-04");

    let current = EntityTable::from_rows(current_rows);
    let diff = IntervalTable::build(&history, &current, current_date);

    let minimal = diff.rows().iter().find(|row| row.name == "Minimal").unwrap();
    assert_eq!(minimal.deltas, [Some(50), Some(110)]);
    assert_eq!(minimal.deltas.iter().flatten().sum::<i64>(), 260 - 100);

    let nord = diff.rows().iter().find(|row| row.name == "Nord").unwrap();
    assert_eq!(nord.deltas, [None, Some(8)]);
    assert_eq!(diff.undefined_count(), 1);

    let path = store.save_derived_records("themes_diff.csv", &diff).unwrap();
    assert!(fs::read_to_string(path).unwrap().starts_with("name,downloads,downloads_2024-01-01,downloads_2024-01-02,"));
    assert_eq!(store.list(Subject::Themes).unwrap().len(), 4);
}
