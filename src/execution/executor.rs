//! Depth-first executor
//!
//! Walks the requested nodes with an explicit stack of enter/complete frames
//! so events come out in declaration order and a suite completes only after
//! every descendant has finished.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::process::{OutputSink, ProcessOutcome, ProcessRunner};
use crate::tree::{Location, Node, NodeId, Test, Tree};
use crate::workspace::Configuration;

use super::events::{RunEvent, RunSummary, SuiteState, TestState};

/// Arguments that run exactly one scenario with a readable report
pub fn run_args(module: &str, extra: &[String], location: &Location) -> Vec<String> {
    let mut args: Vec<String> = [
        "-u",
        "-m",
        module,
        "--format",
        "pretty",
        "--no-skipped",
        "--no-summary",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.extend(extra.iter().cloned());
    args.push(location.target());
    args
}

/// Map a process outcome to a terminal test state and its message
///
/// Exit code 0 passes, any other code fails, anything else is an error.
/// The message prefers stderr and falls back to stdout.
pub fn classify(outcome: ProcessOutcome) -> (TestState, String) {
    match outcome {
        ProcessOutcome::Exited {
            code,
            stdout,
            stderr,
        } => {
            let state = if code == 0 {
                TestState::Passed
            } else {
                TestState::Failed
            };
            let message = if stderr.is_empty() { stdout } else { stderr };
            (state, message)
        }
        ProcessOutcome::SpawnFailed(reason) => (
            TestState::Errored,
            format!("Failed to execute process: {}", reason),
        ),
        ProcessOutcome::Cancelled => (TestState::Errored, "process cancelled".to_string()),
        ProcessOutcome::Failed(reason) => (TestState::Errored, reason),
    }
}

enum Frame<'t> {
    Enter(&'t Node),
    Complete(&'t NodeId),
}

/// Runs selected nodes of a tree and reports their lifecycle
///
/// Events are sent on a channel of any type that wraps [`RunEvent`], so a
/// host can share one ordered channel between run events and its own.
pub struct Executor<'a, E = RunEvent> {
    config: &'a dyn Configuration,
    runner: &'a dyn ProcessRunner,
    sink: &'a dyn OutputSink,
    events: mpsc::UnboundedSender<E>,
    cancel: CancellationToken,
}

impl<'a, E: From<RunEvent> + Send> Executor<'a, E> {
    pub fn new(
        config: &'a dyn Configuration,
        runner: &'a dyn ProcessRunner,
        sink: &'a dyn OutputSink,
        events: mpsc::UnboundedSender<E>,
    ) -> Self {
        Self {
            config,
            runner,
            sink,
            events,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop entering new nodes and kill the running test once `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run each requested id in order
    ///
    /// Ids missing from the tree are skipped without an event. The tree is
    /// only read.
    pub async fn run_selected<S: AsRef<str>>(&self, ids: &[S], tree: &Tree) -> RunSummary {
        let mut summary = RunSummary::default();

        for id in ids {
            let id = id.as_ref();
            if self.cancel.is_cancelled() {
                tracing::info!("Run cancelled; skipping remaining requests");
                break;
            }
            match tree.find(id) {
                Some(node) => self.run_node(node, &mut summary).await,
                None => tracing::debug!("Requested id '{}' not in tree; skipping", id),
            }
        }

        summary
    }

    async fn run_node(&self, node: &Node, summary: &mut RunSummary) {
        let mut stack = vec![Frame::Enter(node)];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Complete(id) => self.emit(RunEvent::suite(id, SuiteState::Completed)),
                Frame::Enter(_) if self.cancel.is_cancelled() => {}
                Frame::Enter(Node::Suite(suite)) => {
                    tracing::debug!("Running suite '{}'", suite.label);
                    self.emit(RunEvent::suite(&suite.id, SuiteState::Running));
                    stack.push(Frame::Complete(&suite.id));
                    stack.extend(suite.children.iter().rev().map(Frame::Enter));
                }
                Frame::Enter(Node::Test(test)) => {
                    self.emit(RunEvent::test(&test.id, TestState::Running, None));
                    let (state, message) = self.execute(test).await;
                    tracing::debug!("Test '{}' {:?}", test.label, state);
                    summary.record(state);
                    self.emit(RunEvent::test(&test.id, state, Some(message)));
                }
            }
        }
    }

    /// Run one scenario in its own process
    async fn execute(&self, test: &Test) -> (TestState, String) {
        let Some(interpreter) = self.config.interpreter_command().await else {
            tracing::error!("Failed to resolve a python interpreter");
            return (
                TestState::Errored,
                "Failed to resolve a python interpreter".to_string(),
            );
        };

        let Some(location) = test.location() else {
            tracing::error!("Cannot run '{}': no line number", test.id);
            return (
                TestState::Errored,
                format!(
                    "Cannot run '{}' because its line in {} is unknown",
                    test.label,
                    test.file.display()
                ),
            );
        };

        let behave = self.config.behave();
        let args = run_args(&behave.module, &behave.args, &location);
        let outcome = self
            .runner
            .run(
                &interpreter,
                &self.config.workspace_root(),
                &args,
                self.sink,
                &self.cancel,
            )
            .await;

        classify(outcome)
    }

    fn emit(&self, event: RunEvent) {
        if self.events.send(event.into()).is_err() {
            tracing::debug!("Run event receiver dropped");
        }
    }
}
