//! # dlgraph graphs
//!
//! Chart rendering for download statistics using plotters.
//!
//! The [`GraphManager`] turns release, theme and plugin tables into the bar
//! inputs of [`types`] and hands them to a [`ChartRenderer`], which writes
//! one PNG per view.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod manager;
pub mod palette;
pub mod renderer;
#[allow(missing_docs)]
pub mod types;

pub use manager::{entity_bars, interval_bars, percent_bars, release_bars, GraphManager};
pub use renderer::{ChartRenderer, EntityBarChart, StackedBarChart};
pub use types::*;
