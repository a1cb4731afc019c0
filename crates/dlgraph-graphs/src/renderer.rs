//! Chart rendering trait and the bar chart implementations

use crate::palette::parse_hex;
use crate::types::{ChartConfig, EntityBarData, StackedBarData, YScale};
use dlgraph_common::{DlGraphError, Result};
use plotters::prelude::*;
use plotters::style::FontTransform;
use std::path::Path;
use tracing::info;

/// Trait for renderers writing one chart image per call
pub trait ChartRenderer {
    /// The data this renderer draws.
    type Data;

    /// Render a chart to a PNG file
    fn render_to_file(&self, config: &ChartConfig, data: &Self::Data, path: &Path) -> Result<()>;

    /// Short name of the chart type, for logs
    fn name(&self) -> &'static str;

    /// Parse a `#rrggbb` colour, black if it is malformed
    fn parse_color(&self, color: &str) -> RGBColor {
        parse_hex(color)
            .map(|(r, g, b)| RGBColor(r, g, b))
            .unwrap_or(BLACK)
    }

    /// Background colour from the style, white by default
    fn background_color(&self, config: &ChartConfig) -> RGBColor {
        config
            .style
            .background_color
            .as_ref()
            .map(|color| self.parse_color(color))
            .unwrap_or(WHITE)
    }
}

/// Maps a value onto the y axis.
pub fn scale_value(scale: YScale, value: f64) -> f64 {
    match scale {
        YScale::Logarithmic => value.max(1.0).log10(),
        YScale::Linear | YScale::Percent => value,
    }
}

/// Top of the y axis and the positions of its labels, both in axis units.
pub fn y_axis(scale: YScale, max_value: f64) -> (f64, Vec<f64>) {
    match scale {
        YScale::Percent => (100.0, (0..=5).map(|i| f64::from(i) * 20.0).collect()),
        YScale::Logarithmic => {
            let top = max_value.max(10.0).log10().ceil();
            (top, (0..=top as u32).map(f64::from).collect())
        }
        YScale::Linear => {
            let step = nice_step(max_value / 5.0);
            let steps = (max_value / step).ceil().max(1.0) as u32;
            let top = f64::from(steps) * step;
            (top, (0..=steps).map(|i| f64::from(i) * step).collect())
        }
    }
}

/// Text of a y axis label.
pub fn y_label(scale: YScale, value: f64) -> String {
    match scale {
        YScale::Percent => format!("{value:.0}%"),
        YScale::Logarithmic => format!("{:.0}", 10f64.powf(value)),
        YScale::Linear => format!("{value:.0}"),
    }
}

/// 1, 2 or 5 times a power of ten, at least `raw` and never below 1.
fn nice_step(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 1.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let residual = raw / magnitude;
    let factor = if residual <= 1.0 {
        1.0
    } else if residual <= 2.0 {
        2.0
    } else if residual <= 5.0 {
        5.0
    } else {
        10.0
    };
    factor * magnitude
}

/// Positions of every `every`-th bar out of `len`.
pub fn x_key_points(len: usize, every: usize) -> Vec<f64> {
    (0..len).step_by(every.max(1)).map(|i| i as f64).collect()
}

fn bar_label(labels: &[String], x: f64) -> String {
    let index = x.round();
    if index < 0.0 || (x - index).abs() > 1e-6 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

/// Stacked bars with one label per bar and a legend of the stacked series.
#[derive(Debug, Default)]
pub struct StackedBarChart;

impl StackedBarChart {
    /// Creates the renderer.
    pub fn new() -> Self {
        Self
    }
}

impl ChartRenderer for StackedBarChart {
    type Data = StackedBarData;

    fn render_to_file(&self, config: &ChartConfig, data: &StackedBarData, path: &Path) -> Result<()> {
        if data.is_empty() {
            return Err(DlGraphError::graph(format!(
                "No bars to draw for '{}'",
                config.title
            )));
        }

        let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
        root.fill(&self.background_color(config))?;

        let scale = config.y_scale;
        let (top, y_ticks) = y_axis(scale, data.max_total());
        let x_ticks = x_key_points(data.len(), data.label_every);
        let font = config.style.font_family.as_str();
        let label_size = f64::from(config.style.label_size);

        let mut chart = ChartBuilder::on(&root)
            .caption(&config.title, (font, f64::from(config.style.title_size)))
            .margin(config.style.margin)
            .x_label_area_size(config.style.x_label_area)
            .y_label_area_size(config.style.y_label_area)
            .build_cartesian_2d(
                (-0.5f64..data.len() as f64 - 0.5).with_key_points(x_ticks),
                (0f64..top).with_key_points(y_ticks),
            )?;

        let x_formatter = |x: &f64| bar_label(&data.labels, *x);
        let y_formatter = |y: &f64| y_label(scale, *y);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(config.x_label.as_deref().unwrap_or(""))
            .y_desc(config.y_label.as_deref().unwrap_or(""))
            .x_label_formatter(&x_formatter)
            .y_label_formatter(&y_formatter)
            .x_label_style((font, label_size).into_font().transform(FontTransform::Rotate90))
            .y_label_style((font, label_size))
            .draw()?;

        let half = data.bar_width / 2.0;
        let segments = data.segments();

        for (series_index, series) in data.series.iter().enumerate() {
            let color = self.parse_color(&series.color);
            let rectangles = segments
                .iter()
                .filter(|(index, _, bottom, top)| *index == series_index && top > bottom)
                .map(|&(_, bar, bottom, top)| {
                    let x = bar as f64;
                    Rectangle::new(
                        [
                            (x - half, scale_value(scale, bottom)),
                            (x + half, scale_value(scale, top)),
                        ],
                        color.filled(),
                    )
                });

            chart
                .draw_series(rectangles)?
                .label(series.name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font((font, label_size))
            .draw()?;

        root.present()?;
        info!("Rendered {} to {}", self.name(), path.display());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stacked bar chart"
    }
}

/// One full-width bar per entity, each with its own colour.
#[derive(Debug, Default)]
pub struct EntityBarChart;

impl EntityBarChart {
    /// Creates the renderer.
    pub fn new() -> Self {
        Self
    }
}

impl ChartRenderer for EntityBarChart {
    type Data = EntityBarData;

    fn render_to_file(&self, config: &ChartConfig, data: &EntityBarData, path: &Path) -> Result<()> {
        if data.bars.is_empty() {
            return Err(DlGraphError::graph(format!(
                "No bars to draw for '{}'",
                config.title
            )));
        }

        let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
        root.fill(&self.background_color(config))?;

        let scale = config.y_scale;
        let max_value = data.bars.iter().map(|bar| bar.value).fold(0.0, f64::max);
        let (top, y_ticks) = y_axis(scale, max_value);
        let x_ticks = x_key_points(data.bars.len(), data.tick_every);
        let font = config.style.font_family.as_str();
        let label_size = f64::from(config.style.label_size);

        let mut chart = ChartBuilder::on(&root)
            .caption(&config.title, (font, f64::from(config.style.title_size)))
            .margin(config.style.margin)
            .x_label_area_size(config.style.x_label_area)
            .y_label_area_size(config.style.y_label_area)
            .build_cartesian_2d(
                (-0.5f64..data.bars.len() as f64 - 0.5).with_key_points(x_ticks),
                (0f64..top).with_key_points(y_ticks),
            )?;

        let x_formatter = |x: &f64| format!("{:.0}", x);
        let y_formatter = |y: &f64| y_label(scale, *y);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(config.x_label.as_deref().unwrap_or(""))
            .y_desc(config.y_label.as_deref().unwrap_or(""))
            .x_label_formatter(&x_formatter)
            .y_label_formatter(&y_formatter)
            .label_style((font, label_size))
            .draw()?;

        chart.draw_series(data.bars.iter().enumerate().map(|(index, bar)| {
            let x = index as f64;
            Rectangle::new(
                [(x - 0.5, 0.0), (x + 0.5, scale_value(scale, bar.value))],
                self.parse_color(&bar.color).filled(),
            )
        }))?;

        if !data.legend.is_empty() {
            for entry in &data.legend {
                let color = self.parse_color(&entry.color);
                chart
                    .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())?
                    .label(entry.label.as_str())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .label_font((font, label_size))
                .draw()?;
        }

        root.present()?;
        info!("Rendered {} to {}", self.name(), path.display());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "entity bar chart"
    }
}
