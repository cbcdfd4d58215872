//! CLI command definitions
//!
//! Defines the clap commands for the mrcheck CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate one or more recorded job runs described by YAML scenarios
    Check {
        /// Paths to the YAML scenario files
        #[arg(required = true)]
        scenarios: Vec<PathBuf>,

        /// Compare output multisets instead of positions
        #[arg(long)]
        unordered: bool,

        /// Compare output positions, whatever the scenario or config says
        #[arg(long, conflicts_with = "unordered")]
        ordered: bool,

        /// Fail on counters that have no expectation
        #[arg(long)]
        strict_counters: bool,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,
    },

    /// Show the configuration file location and effective settings
    Config,
}
