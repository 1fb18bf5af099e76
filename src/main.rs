//! behave-explorer - discover and run behave tests for test-explorer hosts
//!
//! Prints the feature/scenario tree of a workspace and runs selected
//! scenarios, reporting each state change as it happens.

use std::path::PathBuf;

use behave_explorer::common::logging;
use behave_explorer::{cli, commands::Commands};
use clap::Parser;

#[derive(Parser)]
#[command(name = "behave-explorer", about = "Discover and run behave tests")]
#[command(version, long_about = None)]
struct Cli {
    /// Workspace root (default: config file, then current directory)
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    /// Python interpreter to run behave with
    #[arg(long, global = true)]
    python: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    logging::init_cli();

    let cli = Cli::parse();

    match cli::dispatch(cli.command, cli.workspace, cli.python).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
