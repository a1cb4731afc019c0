//! Command line arguments.

use crate::app::{Acquisition, RunOptions, Views};
use clap::Parser;
use dlgraph_common::Subject;
use std::path::PathBuf;

/// Collects download statistics of releases, themes and plugins and renders
/// them as charts.
#[derive(Debug, Clone, Parser)]
#[command(name = "dlgraph", version, about)]
pub struct Cli {
    /// Graph releases
    #[arg(short, long)]
    pub releases: bool,

    /// Graph themes
    #[arg(short, long)]
    pub themes: bool,

    /// Graph plugins
    #[arg(short, long)]
    pub plugins: bool,

    /// Graph releases, themes and plugins
    #[arg(short, long)]
    pub all: bool,

    /// Fetch the most recent data; without it the latest snapshot is used
    #[arg(short, long, conflicts_with = "file")]
    pub download: bool,

    /// Process a previously downloaded JSON file, e.g. `themes-2023-01-05.json`
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Save fetched and processed data
    #[arg(short, long)]
    pub save: bool,

    /// Graph in chronological order
    #[arg(long, visible_alias = "chr")]
    pub chronological: bool,

    /// Graph sorted by total downloads
    #[arg(long, visible_alias = "sort")]
    pub sorted: bool,

    /// Graph downloads between stored snapshots (themes and plugins)
    #[arg(long, visible_alias = "dif")]
    pub difference: bool,

    /// Graph per-platform shares of every version (releases)
    #[arg(long, visible_alias = "norm")]
    pub normalize: bool,

    /// Graph every view
    #[arg(short, long)]
    pub complete: bool,

    /// Plot downloads on a logarithmic scale
    #[arg(short, long)]
    pub logarithm: bool,

    /// Configuration file (YAML or TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `dlgraph_stats=trace`
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Selected subjects in processing order.
    pub fn subjects(&self) -> Vec<Subject> {
        [
            (Subject::Themes, self.themes),
            (Subject::Plugins, self.plugins),
            (Subject::Releases, self.releases),
        ]
        .into_iter()
        .filter(|(_, selected)| *selected || self.all)
        .map(|(subject, _)| subject)
        .collect()
    }

    /// Requested views, all of them with `--complete`.
    pub fn views(&self) -> Views {
        Views {
            chronological: self.chronological || self.complete,
            sorted: self.sorted || self.complete,
            difference: self.difference || self.complete,
            normalize: self.normalize || self.complete,
        }
    }

    /// Where the data of this run comes from.
    pub fn acquisition(&self) -> Acquisition {
        match (&self.file, self.download) {
            (Some(path), _) => Acquisition::File(path.clone()),
            (None, true) => Acquisition::Download,
            (None, false) => Acquisition::Snapshot,
        }
    }

    /// Options of the run.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            subjects: self.subjects(),
            acquisition: self.acquisition(),
            save: self.save,
            views: self.views(),
            logarithmic: self.logarithm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dlgraph").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_subject_selection() {
        assert_eq!(parse(&["-r"]).subjects(), [Subject::Releases]);
        assert_eq!(
            parse(&["-a"]).subjects(),
            [Subject::Themes, Subject::Plugins, Subject::Releases]
        );
        assert!(parse(&[]).subjects().is_empty());
    }

    #[test]
    fn test_complete_enables_every_view() {
        let views = parse(&["-t", "-c"]).views();
        assert!(views.chronological && views.sorted && views.difference && views.normalize);

        let views = parse(&["-t", "--sort", "--dif"]).views();
        assert!(views.sorted && views.difference);
        assert!(!views.chronological && !views.normalize);
    }

    #[test]
    fn test_acquisition_modes() {
        assert_eq!(parse(&["-r"]).acquisition(), Acquisition::Snapshot);
        assert_eq!(parse(&["-r", "-d"]).acquisition(), Acquisition::Download);
        assert_eq!(
            parse(&["-t", "-f", "themes-2023-01-05.json"]).acquisition(),
            Acquisition::File(PathBuf::from("themes-2023-01-05.json"))
        );
    }

    #[test]
    fn test_download_and_file_are_exclusive() {
        let result = Cli::try_parse_from(["dlgraph", "-t", "-d", "-f", "themes.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_run_options() {
        let options = parse(&["-p", "-d", "-s", "-l", "--chronological"]).run_options();
        assert_eq!(options.subjects, [Subject::Plugins]);
        assert!(options.save);
        assert!(options.logarithmic);
        assert!(options.views.chronological);
    }
}
