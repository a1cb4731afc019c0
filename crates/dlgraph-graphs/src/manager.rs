//! Graph manager mapping subject views to chart files.

use crate::palette::{age_legend, cycle, gradient};
use crate::renderer::{ChartRenderer, EntityBarChart, StackedBarChart};
use crate::types::{BarSeries, ChartConfig, EntityBar, EntityBarData, StackedBarData, View, YScale};
use dlgraph_common::{DlGraphError, Platform, Result, Subject};
use dlgraph_config::{ChartsConfig, PlatformColors};
use dlgraph_stats::{EntityRow, EntityTable, IntervalTable, PercentBar, ReleaseTable, VersionBar};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

const RELEASE_BAR_WIDTH: f64 = 0.6;
const INTERVAL_BAR_WIDTH: f64 = 0.8;

/// Renders the requested views of each subject into the charts directory.
pub struct GraphManager {
    settings: ChartsConfig,
    output_dir: PathBuf,
    logarithmic: bool,
}

impl GraphManager {
    /// Creates a manager writing charts to `output_dir`.
    pub fn new(settings: &ChartsConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings: settings.clone(),
            output_dir: output_dir.into(),
            logarithmic: false,
        }
    }

    /// Draws download counts on a logarithmic axis. Percent charts are not affected.
    pub fn with_logarithmic(mut self, logarithmic: bool) -> Self {
        self.logarithmic = logarithmic;
        self
    }

    /// `<charts_dir>/<subject>_<view>.png`
    pub fn output_path(&self, subject: Subject, view: View) -> PathBuf {
        self.output_dir.join(format!("{subject}_{view}.png"))
    }

    fn count_scale(&self) -> YScale {
        if self.logarithmic {
            YScale::Logarithmic
        } else {
            YScale::Linear
        }
    }

    fn prepare_path(&self, subject: Subject, view: View) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(self.output_path(subject, view))
    }

    /// Renders the chronological, sorted or normalized release chart.
    #[instrument(skip(self, table), fields(versions = table.version_count()))]
    pub fn render_release_view(&self, table: &ReleaseTable, view: View) -> Result<PathBuf> {
        let colors = &self.settings.platform_colors;
        let (data, scale, title) = match view {
            View::Chronological => (
                release_bars(&table.chronological(), colors),
                self.count_scale(),
                "Release downloads per version",
            ),
            View::Sorted => (
                release_bars(&table.sorted(), colors),
                self.count_scale(),
                "Release downloads per version, most downloaded first",
            ),
            View::Normalized => (
                percent_bars(&table.normalized()?, colors),
                YScale::Percent,
                "Release downloads per platform share",
            ),
            View::Difference => {
                return Err(DlGraphError::graph("Releases have no difference view"));
            }
        };

        let mut config = ChartConfig::from_settings(&self.settings, title)
            .with_scale(scale)
            .with_x_label("Version");
        if scale == YScale::Percent {
            config.y_label = Some("Share of downloads".to_string());
        }

        let path = self.prepare_path(Subject::Releases, view)?;
        StackedBarChart::new().render_to_file(&config, &data, &path)?;
        info!(view = %view, path = %path.display(), "Rendered release chart");
        Ok(path)
    }

    /// Renders the chronological or sorted chart of themes or plugins.
    #[instrument(skip(self, table), fields(entities = table.len()))]
    pub fn render_entities(&self, subject: Subject, table: &EntityTable, view: View) -> Result<PathBuf> {
        let stops = &self.settings.diverging_palette;
        let data = match view {
            View::Chronological => entity_bars(
                table,
                &table.chronological(),
                stops,
                self.settings.tick_every,
                None,
            ),
            View::Sorted => entity_bars(
                table,
                &table.sorted(),
                stops,
                self.settings.tick_every,
                Some(self.settings.legend_range),
            ),
            View::Normalized | View::Difference => {
                return Err(DlGraphError::graph(format!(
                    "{subject} have no {view} entity view"
                )));
            }
        };

        let order = if view == View::Sorted {
            "most downloaded first"
        } else {
            "oldest first"
        };
        let title = format!("{} downloads, {order}", capitalize(subject.as_str()));
        let config = ChartConfig::from_settings(&self.settings, title)
            .with_scale(self.count_scale())
            .with_x_label(capitalize(subject.as_str()));

        let path = self.prepare_path(subject, view)?;
        EntityBarChart::new().render_to_file(&config, &data, &path)?;
        info!(view = %view, path = %path.display(), "Rendered {subject} chart");
        Ok(path)
    }

    /// Renders downloads per interval, one stacked segment per interval.
    #[instrument(skip(self, table), fields(entities = table.rows().len()))]
    pub fn render_intervals(&self, subject: Subject, table: &IntervalTable) -> Result<PathBuf> {
        if table.intervals().is_empty() {
            return Err(DlGraphError::graph(format!(
                "No intervals to draw for {subject}"
            )));
        }

        let data = interval_bars(table, &self.settings.qualitative_palette, self.settings.tick_every);
        let config = ChartConfig::from_settings(
            &self.settings,
            format!("{} downloads between snapshots", capitalize(subject.as_str())),
        )
        .with_scale(self.count_scale())
        .with_x_label(capitalize(subject.as_str()));

        let path = self.prepare_path(subject, View::Difference)?;
        StackedBarChart::new().render_to_file(&config, &data, &path)?;
        info!(path = %path.display(), "Rendered {subject} difference chart");
        Ok(path)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn platform_color(colors: &PlatformColors, platform: Platform) -> String {
    match platform {
        Platform::Linux => colors.linux.clone(),
        Platform::Windows => colors.windows.clone(),
        Platform::Mac => colors.mac.clone(),
    }
}

fn platform_series(colors: &PlatformColors, values: impl Fn(Platform) -> Vec<f64>) -> Vec<BarSeries> {
    Platform::STACK_ORDER
        .iter()
        .map(|&platform| BarSeries {
            name: platform.display_name().to_string(),
            color: platform_color(colors, platform),
            values: values(platform),
        })
        .collect()
}

/// Per-version stacks of platform downloads, linux at the bottom.
pub fn release_bars(bars: &[VersionBar], colors: &PlatformColors) -> StackedBarData {
    StackedBarData {
        labels: bars.iter().map(|bar| bar.version.clone()).collect(),
        series: platform_series(colors, |platform| {
            bars.iter().map(|bar| bar.downloads(platform) as f64).collect()
        }),
        bar_width: RELEASE_BAR_WIDTH,
        label_every: 1,
    }
}

/// Per-version stacks of platform shares.
pub fn percent_bars(bars: &[PercentBar], colors: &PlatformColors) -> StackedBarData {
    StackedBarData {
        labels: bars.iter().map(|bar| bar.version.clone()).collect(),
        series: platform_series(colors, |platform| bars.iter().map(|bar| bar.share(platform)).collect()),
        bar_width: RELEASE_BAR_WIDTH,
        label_every: 1,
    }
}

/// Bars for `rows` in the given order.
///
/// Every entity keeps the gradient colour of its age rank in `table`, so the
/// chronological and sorted charts colour an entity the same way. With a
/// `legend_range` the legend groups consecutive age ranks.
pub fn entity_bars(
    table: &EntityTable,
    rows: &[EntityRow],
    stops: &[String],
    tick_every: usize,
    legend_range: Option<usize>,
) -> EntityBarData {
    let by_age = table.chronological();
    let colors = gradient(stops, by_age.len());
    let rank: HashMap<&str, usize> = by_age
        .iter()
        .enumerate()
        .map(|(rank, row)| (row.name.as_str(), rank))
        .collect();

    let bars = rows
        .iter()
        .map(|row| EntityBar {
            value: row.downloads as f64,
            color: rank
                .get(row.name.as_str())
                .and_then(|&rank| colors.get(rank))
                .cloned()
                .unwrap_or_else(|| "#000000".to_string()),
        })
        .collect();

    let legend = legend_range
        .map(|range| age_legend(&colors, range))
        .unwrap_or_default();
    debug!(bars = rows.len(), legend = legend.len(), "Prepared entity bars");

    EntityBarData {
        bars,
        tick_every,
        legend,
    }
}

/// One bar per entity stacking its download delta over each interval.
pub fn interval_bars(table: &IntervalTable, palette: &[String], label_every: usize) -> StackedBarData {
    let heights: Vec<Vec<i64>> = table.rows().iter().map(|row| row.stack_heights()).collect();

    let series = table
        .intervals()
        .iter()
        .enumerate()
        .map(|(index, interval)| BarSeries {
            name: interval.to_string(),
            color: cycle(palette, index),
            values: heights
                .iter()
                .map(|row| row.get(index).copied().unwrap_or(0) as f64)
                .collect(),
        })
        .collect();

    StackedBarData {
        labels: table.rows().iter().map(|row| row.name.clone()).collect(),
        series,
        bar_width: INTERVAL_BAR_WIDTH,
        label_every,
    }
}
