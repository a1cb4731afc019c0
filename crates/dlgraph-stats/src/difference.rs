//! Download differences between snapshot dates.

use crate::entities::{EntityRow, EntityTable};
use crate::snapshot::{CsvRecords, SnapshotStore};
use chrono::NaiveDate;
use dlgraph_common::{Result, SnapshotTimestamp, Subject};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// An entity table as it was on a given day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedSnapshot {
    /// Day the snapshot was taken
    pub date: NaiveDate,
    /// Its contents
    pub table: EntityTable,
}

/// Loads the snapshot history of `subject` preceding a table taken at
/// `current`.
///
/// Returns one table per earlier day, oldest first, and the date of
/// `current`.
#[instrument(skip(store))]
pub fn load_history(
    store: &SnapshotStore,
    subject: Subject,
    current: SnapshotTimestamp,
) -> Result<(Vec<DatedSnapshot>, NaiveDate)> {
    let history = store.history(subject, current)?;

    let snapshots = history
        .days
        .iter()
        .map(|file| {
            let rows: Vec<EntityRow> = store.load(file)?;
            Ok(DatedSnapshot {
                date: file.date(),
                table: EntityTable::from_rows(rows),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(days = snapshots.len(), current = %history.current_date, "Loaded history");
    Ok((snapshots, history.current_date))
}

/// A pair of consecutive dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// First day
    pub start: NaiveDate,
    /// Last day
    pub end: NaiveDate,
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Downloads of one entity over time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalRow {
    /// Entity name
    pub name: String,
    /// Downloads in the current table
    pub downloads: Option<u64>,
    /// Downloads in each historical snapshot, oldest first
    pub history: Vec<Option<u64>>,
    /// Change over each interval; `None` when either end lacks the entity
    pub deltas: Vec<Option<i64>>,
}

impl IntervalRow {
    /// Delta over each interval with undefined ones counted as zero, for
    /// stacking.
    pub fn stack_heights(&self) -> Vec<i64> {
        self.deltas.iter().map(|delta| delta.unwrap_or(0)).collect()
    }
}

/// Per-entity download deltas between consecutive snapshot dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTable {
    dates: Vec<NaiveDate>,
    intervals: Vec<Interval>,
    rows: Vec<IntervalRow>,
    undefined: usize,
}

impl IntervalTable {
    /// Joins the history and the current table on entity name.
    ///
    /// The intervals run between consecutive history dates and from the last
    /// history date to `current_date`, which closes against `current`.
    #[instrument(skip(history, current), fields(days = history.len()))]
    pub fn build(
        history: &[DatedSnapshot],
        current: &EntityTable,
        current_date: NaiveDate,
    ) -> Self {
        let dates: Vec<NaiveDate> = history.iter().map(|snapshot| snapshot.date).collect();
        let intervals: Vec<Interval> = dates
            .iter()
            .copied()
            .chain(history.last().map(|_| current_date))
            .collect::<Vec<_>>()
            .windows(2)
            .map(|pair| Interval {
                start: pair[0],
                end: pair[1],
            })
            .collect();

        let names: BTreeSet<&str> = history
            .iter()
            .flat_map(|snapshot| snapshot.table.rows())
            .chain(current.rows())
            .map(|row| row.name.as_str())
            .collect();

        let mut undefined = 0;
        let rows: Vec<IntervalRow> = names
            .into_iter()
            .map(|name| {
                let past: Vec<Option<u64>> = history
                    .iter()
                    .map(|snapshot| snapshot.table.downloads(name))
                    .collect();
                let now = current.downloads(name);

                let deltas: Vec<Option<i64>> = past
                    .iter()
                    .copied()
                    .chain(std::iter::once(now))
                    .collect::<Vec<_>>()
                    .windows(2)
                    .map(|pair| match (pair[0], pair[1]) {
                        (Some(start), Some(end)) => Some(end as i64 - start as i64),
                        _ => None,
                    })
                    .collect();
                undefined += deltas.iter().filter(|delta| delta.is_none()).count();

                IntervalRow {
                    name: name.to_string(),
                    downloads: now,
                    history: past,
                    deltas,
                }
            })
            .collect();

        if undefined > 0 {
            warn!(
                undefined,
                "Some entities are missing from a snapshot, their interval deltas are undefined"
            );
        }
        info!(
            entities = rows.len(),
            intervals = intervals.len(),
            "Built interval table"
        );

        Self {
            dates,
            intervals,
            rows,
            undefined,
        }
    }

    /// Intervals in chronological order.
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Rows ordered by entity name.
    pub fn rows(&self) -> &[IntervalRow] {
        &self.rows
    }

    /// Number of undefined deltas.
    pub fn undefined_count(&self) -> usize {
        self.undefined
    }
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl CsvRecords for IntervalTable {
    fn header(&self) -> Vec<String> {
        ["name".to_string(), "downloads".to_string()]
            .into_iter()
            .chain(self.dates.iter().map(|date| format!("downloads_{date}")))
            .chain(self.intervals.iter().map(Interval::to_string))
            .collect()
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                std::iter::once(row.name.clone())
                    .chain(std::iter::once(cell(row.downloads)))
                    .chain(row.history.iter().map(|value| cell(*value)))
                    .chain(row.deltas.iter().map(|value| cell(*value)))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::write_records;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn table(entries: &[(&str, u64)]) -> EntityTable {
        EntityTable::from_rows(
            entries
                .iter()
                .enumerate()
                .map(|(age, (name, downloads))| EntityRow {
                    name: (*name).to_string(),
                    downloads: *downloads,
                    age,
                })
                .collect(),
        )
    }

    fn sample() -> IntervalTable {
        let history = vec![
            DatedSnapshot {
                date: day(1),
                table: table(&[("Minimal", 100), ("Atom", 50)]),
            },
            DatedSnapshot {
                date: day(2),
                table: table(&[("Minimal", 130), ("Atom", 55), ("Nord", 3)]),
            },
        ];
        let current = table(&[("Minimal", 180), ("Nord", 10)]);
        IntervalTable::build(&history, &current, day(4))
    }

    #[test]
    fn test_intervals() {
        let diff = sample();
        let labels: Vec<String> = diff.intervals().iter().map(Interval::to_string).collect();
        assert_eq!(labels, ["[2024-03-01, 2024-03-02]", "[2024-03-02, 2024-03-04]"]);
    }

    #[test]
    fn test_deltas_and_undefined() {
        let diff = sample();
        let rows = diff.rows();

        assert_eq!(rows[0].name, "Atom");
        assert_eq!(rows[0].deltas, [Some(5), None]);
        assert_eq!(rows[1].name, "Minimal");
        assert_eq!(rows[1].deltas, [Some(30), Some(50)]);
        assert_eq!(rows[2].name, "Nord");
        assert_eq!(rows[2].deltas, [None, Some(7)]);
        assert_eq!(rows[2].stack_heights(), [0, 7]);

        assert_eq!(diff.undefined_count(), 2);
    }

    #[test]
    fn test_deltas_sum_to_total_change() {
        let diff = sample();
        let minimal = &diff.rows()[1];
        let sum: i64 = minimal.deltas.iter().flatten().sum();
        assert_eq!(sum, 180 - 100);
    }

    #[test]
    fn test_empty_history_has_no_intervals() {
        let diff = IntervalTable::build(&[], &table(&[("a", 1)]), day(1));
        assert!(diff.intervals().is_empty());
        assert!(diff.rows()[0].deltas.is_empty());
    }

    #[test]
    fn test_csv_output() {
        let mut out = Vec::new();
        write_records(&mut out, &sample()).unwrap();

        insta::assert_snapshot!(String::from_utf8(out).unwrap(), @r###"
        name,downloads,downloads_2024-03-01,downloads_2024-03-02,"[2024-03-01, 2024-03-02]","[2024-03-02, 2024-03-04]"
        Atom,,50,55,5,
        Minimal,180,100,130,30,50
        Nord,10,,3,,7
        "###);
    }
}
