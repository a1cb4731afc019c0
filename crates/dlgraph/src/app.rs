//! Per-subject pipelines: acquire, normalize, persist, aggregate and render.

use dlgraph_common::{DlGraphError, Result, SnapshotTimestamp, Subject};
use dlgraph_config::Config;
use dlgraph_graphs::{GraphManager, View};
use dlgraph_stats::{
    load_history, normalize_releases, parse_entity_stats, read_provided_file, AssetRow, DataFetcher,
    EntityRow, EntityTable, IntervalTable, ReleaseTable, SnapshotStore,
};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};

/// Source of the data processed in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    /// Fetch the live endpoints
    Download,
    /// Read a previously downloaded JSON document
    File(PathBuf),
    /// Reuse the newest stored snapshot
    Snapshot,
}

/// Views requested for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Views {
    /// Oldest first
    pub chronological: bool,
    /// Most downloaded first
    pub sorted: bool,
    /// Downloads between snapshot dates, themes and plugins
    pub difference: bool,
    /// Platform shares per version, releases
    pub normalize: bool,
}

/// Everything a run needs besides the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Subjects to process, in order
    pub subjects: Vec<Subject>,
    /// Where the data comes from
    pub acquisition: Acquisition,
    /// Persist raw documents, snapshots and derived tables
    pub save: bool,
    /// Charts to render
    pub views: Views,
    /// Logarithmic y axis for download counts
    pub logarithmic: bool,
}

/// Result of one subject.
#[derive(Debug)]
pub struct SubjectOutcome {
    /// The subject
    pub subject: Subject,
    /// Charts written
    pub charts: Vec<PathBuf>,
    /// Why the subject stopped early, if it did
    pub error: Option<DlGraphError>,
}

/// Outcomes of a whole run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// One entry per processed subject
    pub outcomes: Vec<SubjectOutcome>,
}

impl RunReport {
    /// Whether every subject either succeeded or only lacked stored snapshots.
    pub fn success(&self) -> bool {
        self.outcomes.iter().all(|outcome| {
            outcome
                .error
                .as_ref()
                .map_or(true, DlGraphError::is_missing_snapshot)
        })
    }

    /// All charts written during the run.
    pub fn charts(&self) -> impl Iterator<Item = &PathBuf> {
        self.outcomes.iter().flat_map(|outcome| outcome.charts.iter())
    }
}

/// A raw document and the time it describes.
struct Acquired {
    document: Value,
    timestamp: SnapshotTimestamp,
}

/// The application: one fetcher, one snapshot store and one chart manager.
pub struct App {
    config: Config,
    options: RunOptions,
    fetcher: DataFetcher,
    store: SnapshotStore,
    graphs: GraphManager,
}

impl App {
    /// Builds the application from a validated configuration.
    pub fn new(config: Config, options: RunOptions) -> Result<Self> {
        let fetcher = DataFetcher::new(&config.http)?;
        let store = SnapshotStore::new(&config.storage.processed_dir);
        let graphs = GraphManager::new(&config.charts, &config.storage.charts_dir)
            .with_logarithmic(options.logarithmic);

        Ok(Self {
            config,
            options,
            fetcher,
            store,
            graphs,
        })
    }

    /// The snapshot store of this run.
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Processes every selected subject in turn.
    ///
    /// A subject without stored snapshots is reported and skipped; any other
    /// failure is recorded and the remaining subjects still run.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::default();

        for &subject in &self.options.subjects {
            let outcome = match self.run_subject(subject).await {
                Ok(charts) => SubjectOutcome {
                    subject,
                    charts,
                    error: None,
                },
                Err(e) => {
                    if e.is_missing_snapshot() {
                        warn!(subject = %subject, "{e}");
                    } else {
                        error!(subject = %subject, "Failed to process {subject}: {e}");
                    }
                    SubjectOutcome {
                        subject,
                        charts: Vec::new(),
                        error: Some(e),
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        info!(
            subjects = report.outcomes.len(),
            charts = report.charts().count(),
            "Run finished"
        );
        report
    }

    /// Runs the pipeline of one subject and returns the charts it rendered.
    pub async fn run_subject(&self, subject: Subject) -> Result<Vec<PathBuf>> {
        match subject {
            Subject::Releases => self.run_releases().await,
            Subject::Themes | Subject::Plugins => self.run_entities(subject).await,
        }
    }

    async fn acquire(&self, subject: Subject) -> Result<Option<Acquired>> {
        match &self.options.acquisition {
            Acquisition::Download => {
                let timestamp = SnapshotTimestamp::now();
                let raw_base = self
                    .options
                    .save
                    .then(|| self.config.storage.raw_dir.join(format!("{subject}.json")));
                let url = self.config.sources.url_for(subject);
                let document = self
                    .fetcher
                    .fetch_and_save(url, raw_base.as_deref(), timestamp)
                    .await?;
                Ok(Some(Acquired { document, timestamp }))
            }
            Acquisition::File(path) => {
                let (document, timestamp) = read_provided_file(path)?;
                Ok(Some(Acquired { document, timestamp }))
            }
            Acquisition::Snapshot => Ok(None),
        }
    }

    /// Asset rows from a fresh document or from the newest snapshot.
    #[instrument(skip(self))]
    async fn release_rows(&self) -> Result<Vec<AssetRow>> {
        match self.acquire(Subject::Releases).await? {
            Some(acquired) => {
                let rows = normalize_releases(&acquired.document)?;
                if self.options.save {
                    self.store.save(&rows, "releases.csv", acquired.timestamp)?;
                }
                Ok(rows)
            }
            None => Ok(self.store.load_latest(Subject::Releases)?.1),
        }
    }

    fn wants_charts(&self) -> bool {
        let views = self.options.views;
        views.chronological || views.sorted || views.difference || views.normalize
    }

    async fn run_releases(&self) -> Result<Vec<PathBuf>> {
        let rows = self.release_rows().await?;
        let table = ReleaseTable::from_assets(&rows, self.config.aggregation.low_volume_threshold);
        info!(
            assets = rows.len(),
            versions = table.version_count(),
            "Aggregated releases"
        );

        if self.options.save {
            self.store.save_derived("releases_versions.csv", table.rows())?;
        }

        let mut charts = Vec::new();
        if table.is_empty() {
            if self.wants_charts() {
                warn!("No release above the low-volume threshold, skipping release charts");
            }
            return Ok(charts);
        }

        let views = self.options.views;
        if views.chronological {
            charts.push(self.graphs.render_release_view(&table, View::Chronological)?);
        }
        if views.sorted {
            charts.push(self.graphs.render_release_view(&table, View::Sorted)?);
        }
        if views.normalize {
            charts.push(self.graphs.render_release_view(&table, View::Normalized)?);
        }
        if views.difference {
            debug!("Releases have no difference view");
        }

        Ok(charts)
    }

    /// Entity table from a fresh document or from the newest snapshot,
    /// with the time it was taken.
    #[instrument(skip(self))]
    async fn entity_table(&self, subject: Subject) -> Result<(EntityTable, SnapshotTimestamp)> {
        match self.acquire(subject).await? {
            Some(acquired) => {
                let table = EntityTable::from_rows(parse_entity_stats(&acquired.document)?);
                if self.options.save {
                    self.store
                        .save(&table.chronological(), &format!("{subject}.csv"), acquired.timestamp)?;
                }
                Ok((table, acquired.timestamp))
            }
            None => {
                let (file, rows): (_, Vec<EntityRow>) = self.store.load_latest(subject)?;
                Ok((EntityTable::from_rows(rows), file.timestamp))
            }
        }
    }

    async fn run_entities(&self, subject: Subject) -> Result<Vec<PathBuf>> {
        let (table, taken) = self.entity_table(subject).await?;
        info!(subject = %subject, entities = table.len(), "Loaded {subject}");

        let mut charts = Vec::new();
        if table.is_empty() {
            if self.wants_charts() {
                warn!(subject = %subject, "No {subject} to graph, skipping charts");
            }
            return Ok(charts);
        }

        let views = self.options.views;
        if views.chronological {
            charts.push(self.graphs.render_entities(subject, &table, View::Chronological)?);
        }
        if views.sorted {
            charts.push(self.graphs.render_entities(subject, &table, View::Sorted)?);
        }
        if views.difference {
            match self.interval_table(subject, &table, taken) {
                Ok(intervals) => charts.push(self.graphs.render_intervals(subject, &intervals)?),
                Err(e) if e.is_missing_snapshot() => {
                    warn!(subject = %subject, "Skipping difference view: {e}");
                }
                Err(e) => return Err(e),
            }
        }
        if views.normalize {
            debug!(subject = %subject, "No normalized view for {subject}");
        }

        Ok(charts)
    }

    /// Differences `current`, taken at `taken`, against the stored snapshots
    /// of `subject` that precede it. Saves `<subject>_diff.csv` when saving
    /// is enabled.
    pub fn interval_table(
        &self,
        subject: Subject,
        current: &EntityTable,
        taken: SnapshotTimestamp,
    ) -> Result<IntervalTable> {
        let (history, current_date) = load_history(&self.store, subject, taken)?;
        let intervals = IntervalTable::build(&history, current, current_date);

        if self.options.save {
            self.store
                .save_derived_records(&format!("{subject}_diff.csv"), &intervals)?;
        }

        Ok(intervals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(error: Option<DlGraphError>) -> SubjectOutcome {
        SubjectOutcome {
            subject: Subject::Themes,
            charts: vec![PathBuf::from("charts/themes_sorted.png")],
            error,
        }
    }

    #[test]
    fn test_missing_snapshots_do_not_fail_the_run() {
        let report = RunReport {
            outcomes: vec![
                outcome(None),
                outcome(Some(DlGraphError::no_snapshot("plugins", "processed-data"))),
            ],
        };
        assert!(report.success());
        assert_eq!(report.charts().count(), 2);
    }

    #[test]
    fn test_other_errors_fail_the_run() {
        let report = RunReport {
            outcomes: vec![outcome(Some(DlGraphError::format("bad document")))],
        };
        assert!(!report.success());
    }
}
