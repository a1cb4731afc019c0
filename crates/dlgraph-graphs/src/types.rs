//! Chart configuration and renderer input types.

use dlgraph_config::ChartsConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A chart a subject can be rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Oldest first
    Chronological,
    /// Most downloaded first
    Sorted,
    /// Per-platform percentages, releases only
    Normalized,
    /// Downloads per interval between snapshots, themes and plugins only
    Difference,
}

impl View {
    /// Name used in chart file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chronological => "chronological",
            Self::Sorted => "sorted",
            Self::Normalized => "normalized",
            Self::Difference => "difference",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How values map onto the y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YScale {
    /// Plain download counts
    #[default]
    Linear,
    /// Download counts on a base-10 logarithmic axis
    Logarithmic,
    /// Shares fixed to 0..100 with `%` labels
    Percent,
}

/// Chart configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub y_scale: YScale,
    pub style: StyleConfig,
}

impl ChartConfig {
    /// A chart sized and styled after the `charts` configuration section.
    pub fn from_settings(settings: &ChartsConfig, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            width: settings.width,
            height: settings.height,
            x_label: None,
            y_label: Some("Downloads".to_string()),
            y_scale: YScale::Linear,
            style: StyleConfig {
                font_family: settings.font_family.clone(),
                background_color: Some(settings.background_color.clone()),
                ..StyleConfig::default()
            },
        }
    }

    /// Sets the y scale.
    pub fn with_scale(mut self, y_scale: YScale) -> Self {
        self.y_scale = y_scale;
        self
    }

    /// Sets the x axis description.
    pub fn with_x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = Some(label.into());
        self
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: "Downloads".to_string(),
            width: 2000,
            height: 600,
            x_label: None,
            y_label: None,
            y_scale: YScale::Linear,
            style: StyleConfig::default(),
        }
    }
}

/// Fonts, colours and spacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    pub font_family: String,
    pub title_size: u32,
    pub label_size: u32,
    pub background_color: Option<String>,
    pub margin: u32,
    pub x_label_area: u32,
    pub y_label_area: u32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            title_size: 24,
            label_size: 14,
            background_color: Some("#ffffff".to_string()),
            margin: 20,
            x_label_area: 70,
            y_label_area: 90,
        }
    }
}

/// A legend entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

/// One stacked layer, a value per bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub name: String,
    pub color: String,
    pub values: Vec<f64>,
}

/// Input of the stacked bar renderer. Series are stacked in order, the
/// first at the bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedBarData {
    /// One label per bar
    pub labels: Vec<String>,
    pub series: Vec<BarSeries>,
    /// Fraction of a slot a bar occupies
    pub bar_width: f64,
    /// Label every n-th bar
    pub label_every: usize,
}

impl StackedBarData {
    /// Number of bars.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether there are no bars.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Stack bounds of every segment, bar by bar: `(series, bar, bottom, top)`.
    ///
    /// Negative values do not stack and are drawn as empty segments.
    pub fn segments(&self) -> Vec<(usize, usize, f64, f64)> {
        let mut bottoms = vec![0.0; self.len()];
        let mut segments = Vec::new();

        for (series_index, series) in self.series.iter().enumerate() {
            for (bar, bottom) in bottoms.iter_mut().enumerate() {
                let value = series.values.get(bar).copied().unwrap_or(0.0).max(0.0);
                segments.push((series_index, bar, *bottom, *bottom + value));
                *bottom += value;
            }
        }

        segments
    }

    /// Height of the tallest stack.
    pub fn max_total(&self) -> f64 {
        (0..self.len())
            .map(|bar| {
                self.series
                    .iter()
                    .map(|series| series.values.get(bar).copied().unwrap_or(0.0).max(0.0))
                    .sum::<f64>()
            })
            .fold(0.0, f64::max)
    }
}

/// One bar of an entity chart.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityBar {
    pub value: f64,
    pub color: String,
}

/// Input of the entity bar renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityBarData {
    pub bars: Vec<EntityBar>,
    /// Label every n-th bar with its position
    pub tick_every: usize,
    /// Age ranges, empty for no legend
    pub legend: Vec<LegendEntry>,
}
