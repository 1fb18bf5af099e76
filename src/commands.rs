//! CLI command definitions
//!
//! Defines the clap commands for the behave-explorer CLI.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Discover features and scenarios and print the test tree
    Discover {
        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run features or scenarios by id (see `discover` for ids)
    Run {
        /// Suite or test ids; a suite id runs all of its scenarios
        #[arg(required_unless_present = "all")]
        ids: Vec<String>,

        /// Run every discovered test
        #[arg(long, conflicts_with = "ids")]
        all: bool,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,

        /// Hide behave output, only show results
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show the resolved interpreter, workspace and config file
    Config,
}
