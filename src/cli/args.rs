//! CLI argument structures

use crate::display::ReportFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Run chained AI analysis agents over a business-acquisition deal
#[derive(Parser, Debug)]
#[command(name = "dealflow")]
#[command(about = "dealflow - Run chained AI analysis agents over acquisition deals", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a workflow against a deal
    #[command(name = "run")]
    Run {
        /// Id of the workflow to run (see `dealflow list workflows`)
        workflow: String,

        /// JSON file describing the deal
        #[arg(short = 'd', long, value_name = "FILE")]
        deal: PathBuf,

        /// Report format
        #[arg(short = 'f', long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,

        /// Write the report to a file instead of stdout
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Disable the live progress display
        #[arg(long)]
        no_progress: bool,
    },

    /// List available agents and workflows
    #[command(name = "list")]
    List {
        /// Only list this kind of entry
        #[arg(value_enum)]
        what: Option<ListTarget>,
    },

    /// Check workflow definitions against the agent catalog
    #[command(name = "validate")]
    Validate {
        /// Only check this workflow
        workflow: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListTarget {
    Agents,
    Workflows,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "dealflow",
            "-vv",
            "run",
            "full_initial_analysis",
            "--deal",
            "deal.json",
            "--format",
            "json",
            "--no-progress",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run {
                workflow,
                deal,
                format,
                output,
                no_progress,
            } => {
                assert_eq!(workflow, "full_initial_analysis");
                assert_eq!(deal, PathBuf::from("deal.json"));
                assert_eq!(format, ReportFormat::Json);
                assert!(output.is_none());
                assert!(no_progress);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_run_requires_deal() {
        assert!(Cli::try_parse_from(["dealflow", "run", "full_initial_analysis"]).is_err());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["dealflow", "list", "agents", "--config", "x.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(
            cli.command,
            Commands::List {
                what: Some(ListTarget::Agents)
            }
        ));
    }
}
