//! CLI command handling
//!
//! Drives an [`Explorer`] for each command and formats its events, either
//! for a terminal or as JSON lines for a host process.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use tokio::sync::mpsc;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{paths, Error, Result};
use crate::execution::{RunEvent, RunSummary, SuiteState, TestState};
use crate::explorer::{EventOutputSink, Explorer, ExplorerEvent};
use crate::process::{NullSink, OutputSink, SubprocessRunner};
use crate::tree::{Node, NodeId, Tree};
use crate::workspace::{Configuration, WorkspaceConfig};

/// Dispatch a CLI command, returning the process exit code
pub async fn dispatch(
    command: Commands,
    workspace: Option<PathBuf>,
    python: Option<PathBuf>,
) -> Result<i32> {
    let config = WorkspaceConfig::new(Config::load()?, workspace, python);

    match command {
        Commands::Discover { json } => {
            let (tx, _rx) = mpsc::unbounded_channel();
            let explorer = Explorer::new(
                Arc::new(config),
                Arc::new(SubprocessRunner::new()),
                Arc::new(NullSink),
                tx,
            );
            let tree = explorer.load().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(tree.as_ref())?);
            } else {
                print_tree(&tree);
            }
            Ok(0)
        }

        Commands::Run {
            ids,
            all,
            json,
            quiet,
        } => {
            // The root suite holds every feature
            let ids = if all { vec![String::new()] } else { ids };
            let summary = run(config, ids, json, quiet).await?;
            Ok(if summary.success() { 0 } else { 1 })
        }

        Commands::Config => {
            print_config(&config).await;
            Ok(0)
        }
    }
}

/// Load the tree, run `ids`, and print events until the run finishes
///
/// Ctrl+C cancels the run; the in-flight test is reported as errored.
async fn run(config: WorkspaceConfig, ids: Vec<String>, json: bool, quiet: bool) -> Result<RunSummary> {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink: Arc<dyn OutputSink> = if quiet && !json {
        Arc::new(NullSink)
    } else {
        Arc::new(EventOutputSink::new(tx.clone()))
    };

    let explorer = Arc::new(Explorer::new(
        Arc::new(config),
        Arc::new(SubprocessRunner::new()),
        sink,
        tx,
    ));
    let printer = tokio::spawn(print_events(rx, json));

    explorer.load().await?;

    let mut handle = {
        let explorer = explorer.clone();
        tokio::spawn(async move { explorer.run(&ids).await })
    };

    let result = loop {
        tokio::select! {
            joined = &mut handle => {
                break joined.map_err(|e| Error::Internal(format!("Run task failed: {}", e)))?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, cancelling run");
                explorer.cancel();
            }
        }
    };

    // Closing the last sender lets the printer drain and exit
    drop(explorer);
    if let Err(e) = printer.await {
        tracing::warn!("Event printer failed: {}", e);
    }

    result
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<ExplorerEvent>, json: bool) {
    while let Some(event) = rx.recv().await {
        if json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!("Failed to serialize event: {}", e),
            }
        } else {
            print_event(&event);
        }
    }
}

fn print_event(event: &ExplorerEvent) {
    match event {
        ExplorerEvent::LoadStarted => {}
        ExplorerEvent::LoadFinished { suite, error } => {
            if let Some(error) = error {
                println!("{} {}", "Load failed:".red().bold(), error);
            } else if let Some(tree) = suite {
                println!(
                    "{}",
                    format!(
                        "Loaded {} features, {} tests",
                        tree.features().len(),
                        tree.test_count()
                    )
                    .dimmed()
                );
            }
        }
        ExplorerEvent::RunStarted { tests } => {
            println!("{} {} request(s)", "Running".blue().bold(), tests.len());
        }
        ExplorerEvent::State(RunEvent::Suite { id, state }) => {
            if !id.is_root() && *state == SuiteState::Running {
                println!("\n{}", display_name(id).white().bold());
            }
        }
        ExplorerEvent::State(RunEvent::Test { id, state, message }) => match state {
            TestState::Running => println!("  {} {}", "▶".cyan(), display_name(id)),
            TestState::Passed => println!("  {} {}", "✓".green(), display_name(id)),
            TestState::Failed => println!("  {} {}", "✗".red(), display_name(id).red()),
            TestState::Errored => {
                println!("  {} {}", "!".yellow(), display_name(id).yellow());
                if let Some(message) = message {
                    println!("    {}", message.trim().yellow());
                }
            }
        },
        ExplorerEvent::Output { text } => print!("{}", text),
        ExplorerEvent::RunFinished { summary } => print_summary(summary),
    }
}

fn print_summary(summary: &RunSummary) {
    let passed = format!("{} passed", summary.passed).green();
    let failed = format!("{} failed", summary.failed);
    let errored = format!("{} errored", summary.errored);
    println!(
        "\n{}: {}, {}, {}",
        "Results".bold(),
        passed,
        if summary.failed > 0 { failed.red() } else { failed.normal() },
        if summary.errored > 0 { errored.yellow() } else { errored.normal() },
    );
}

/// Scenario or feature name without its location
fn display_name(id: &NodeId) -> &str {
    id.parse().map(|(name, _)| name).unwrap_or(id.as_str())
}

fn print_tree(tree: &Tree) {
    if tree.is_empty() {
        println!("No tests found");
        return;
    }

    for feature in tree.features() {
        print_node(feature, 0);
    }
    println!(
        "\n{} features, {} tests",
        tree.features().len(),
        tree.test_count()
    );
}

fn print_node(node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    let label = match node {
        Node::Suite(_) => node.label().bold(),
        Node::Test(_) => node.label().normal(),
    };
    let line = node
        .line()
        .map(|l| (l + 1).to_string())
        .unwrap_or_else(|| "?".to_string());
    let file = node
        .file()
        .map(|f| f.display().to_string())
        .unwrap_or_default();

    println!("{}{}  {}", indent, label, format!("{}:{}", file, line).dimmed());
    println!("{}  {}", indent, format!("id: {}", node.id()).dimmed());

    for child in node.children() {
        print_node(child, depth + 1);
    }
}

async fn print_config(config: &WorkspaceConfig) {
    let config_file = paths::config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(unavailable)".to_string());
    println!("Config file:  {}", config_file);
    println!("Workspace:    {}", config.workspace_root().display());

    match config.interpreter_command().await {
        Some(python) => println!(
            "Interpreter:  {} ({})",
            python.display(),
            config.interpreter_source()
        ),
        None => println!("Interpreter:  {}", "not found".red()),
    }

    let behave = config.behave();
    println!("behave:       -m {} {}", behave.module, behave.args.join(" "));
}
