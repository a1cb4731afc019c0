//! # dlgraph
//!
//! Download statistics collector and chart generator.
//!
//! The binary parses the [`cli`] arguments into [`RunOptions`] and runs the
//! [`App`], which processes each selected subject in turn.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod cli;

pub use app::{Acquisition, App, RunOptions, RunReport, SubjectOutcome, Views};
pub use cli::Cli;
