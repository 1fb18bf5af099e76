//! Test explorer host lifecycle
//!
//! Owns the current test tree snapshot and exposes the three operations a
//! test-explorer host drives: load (discover), run, and cancel. Everything is
//! reported on one ordered event channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::common::{Error, Result};
use crate::discovery;
use crate::execution::{Executor, RunEvent, RunSummary};
use crate::process::{OutputSink, ProcessRunner};
use crate::tree::Tree;
use crate::workspace::Configuration;

/// Everything a host is told about loads and runs
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExplorerEvent {
    LoadStarted,
    LoadFinished {
        #[serde(skip_serializing_if = "Option::is_none")]
        suite: Option<Arc<Tree>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    RunStarted {
        tests: Vec<String>,
    },
    State(RunEvent),
    Output {
        text: String,
    },
    RunFinished {
        summary: RunSummary,
    },
}

impl From<RunEvent> for ExplorerEvent {
    fn from(event: RunEvent) -> Self {
        ExplorerEvent::State(event)
    }
}

/// Output sink that turns process output into [`ExplorerEvent::Output`]
///
/// Sharing the event channel keeps output and state changes in one order.
pub struct EventOutputSink {
    events: mpsc::UnboundedSender<ExplorerEvent>,
}

impl EventOutputSink {
    pub fn new(events: mpsc::UnboundedSender<ExplorerEvent>) -> Self {
        Self { events }
    }
}

impl OutputSink for EventOutputSink {
    fn append(&self, text: &str) {
        let _ = self.events.send(ExplorerEvent::Output {
            text: text.to_string(),
        });
    }
}

/// The run that `cancel` targets
struct ActiveRun {
    id: u64,
    cancel: CancellationToken,
}

/// behave test adapter for one workspace
pub struct Explorer {
    config: Arc<dyn Configuration>,
    runner: Arc<dyn ProcessRunner>,
    sink: Arc<dyn OutputSink>,
    events: mpsc::UnboundedSender<ExplorerEvent>,
    tree: Mutex<Option<Arc<Tree>>>,
    current_run: Mutex<Option<ActiveRun>>,
    next_run_id: AtomicU64,
    /// Held for the whole of a run so runs never overlap
    run_lock: tokio::sync::Mutex<()>,
}

impl Explorer {
    pub fn new(
        config: Arc<dyn Configuration>,
        runner: Arc<dyn ProcessRunner>,
        sink: Arc<dyn OutputSink>,
        events: mpsc::UnboundedSender<ExplorerEvent>,
    ) -> Self {
        Self {
            config,
            runner,
            sink,
            events,
            tree: Mutex::new(None),
            current_run: Mutex::new(None),
            next_run_id: AtomicU64::new(0),
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// The most recently loaded tree
    pub fn tree(&self) -> Option<Arc<Tree>> {
        self.tree
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Discover tests and replace the current snapshot
    pub async fn load(&self) -> Result<Arc<Tree>> {
        tracing::info!("Loading behave tests");
        self.emit(ExplorerEvent::LoadStarted);

        match discovery::discover(self.config.as_ref(), self.runner.as_ref()).await {
            Ok(tree) => {
                let tree = Arc::new(tree);
                *self.tree.lock().unwrap_or_else(PoisonError::into_inner) = Some(tree.clone());
                self.emit(ExplorerEvent::LoadFinished {
                    suite: Some(tree.clone()),
                    error: None,
                });
                Ok(tree)
            }
            Err(e) => {
                tracing::error!("Failed to load tests: {}", e);
                self.emit(ExplorerEvent::LoadFinished {
                    suite: None,
                    error: Some(e.to_string()),
                });
                Err(e)
            }
        }
    }

    /// Run suites and tests of the current snapshot
    ///
    /// Starting a run cancels the previous one and waits for it to finish, so
    /// the events of two runs never interleave.
    pub async fn run(&self, tests: &[String]) -> Result<RunSummary> {
        let tree = self.tree().ok_or(Error::NotLoaded)?;

        let id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let previous = self
            .current_run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(ActiveRun {
                id,
                cancel: cancel.clone(),
            });
        if let Some(previous) = previous {
            tracing::info!("Cancelling previous run before starting a new one");
            previous.cancel.cancel();
        }

        let _running = self.run_lock.lock().await;

        tracing::info!("Running tests {:?}", tests);
        self.sink.clear();
        self.emit(ExplorerEvent::RunStarted {
            tests: tests.to_vec(),
        });

        let summary = Executor::new(
            self.config.as_ref(),
            self.runner.as_ref(),
            self.sink.as_ref(),
            self.events.clone(),
        )
        .with_cancellation(cancel)
        .run_selected(tests, &tree)
        .await;

        {
            // A newer run may already own the slot
            let mut current = self.current_run.lock().unwrap_or_else(PoisonError::into_inner);
            if current.as_ref().is_some_and(|run| run.id == id) {
                current.take();
            }
        }

        tracing::info!(
            "Run finished: {} passed, {} failed, {} errored",
            summary.passed,
            summary.failed,
            summary.errored
        );
        self.emit(ExplorerEvent::RunFinished { summary });
        Ok(summary)
    }

    /// Cancel the latest run, killing its test process
    pub fn cancel(&self) {
        let current = self.current_run.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(run) = current.as_ref() {
            tracing::info!("Cancelling test run");
            run.cancel.cancel();
        }
    }

    fn emit(&self, event: ExplorerEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Explorer event receiver dropped");
        }
    }
}
