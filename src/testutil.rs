//! Test doubles for the configuration collaborator and the process runner

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::process::{OutputSink, ProcessOutcome, ProcessRunner};
use crate::workspace::Configuration;

/// Fixed configuration
pub struct FakeConfig {
    python: Option<PathBuf>,
    root: PathBuf,
}

impl FakeConfig {
    pub fn with_python() -> Self {
        Self {
            python: Some(PathBuf::from("/usr/bin/python3")),
            root: PathBuf::from("/work"),
        }
    }

    pub fn without_python() -> Self {
        Self {
            python: None,
            root: PathBuf::from("/work"),
        }
    }
}

#[async_trait]
impl Configuration for FakeConfig {
    async fn interpreter_command(&self) -> Option<PathBuf> {
        self.python.clone()
    }

    fn workspace_root(&self) -> PathBuf {
        self.root.clone()
    }
}

/// One recorded invocation
#[derive(Debug, Clone)]
pub struct Call {
    pub command: PathBuf,
    pub working_dir: PathBuf,
    pub args: Vec<String>,
}

enum Script {
    Outcome(ProcessOutcome),
    /// Cancel the run token, then report the kill
    CancelRun,
    /// Hang until the run is cancelled from outside
    WaitForCancel,
}

/// Runner that replays scripted outcomes instead of spawning processes
///
/// Outcomes are picked by the last argument (the behave target) when a rule
/// matches, otherwise the default outcome is used. Captured stdout/stderr of
/// `Exited` outcomes is echoed to the sink.
pub struct ScriptedRunner {
    rules: Vec<(String, Script)>,
    default: Mutex<Vec<ProcessOutcome>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedRunner {
    /// Replay outcomes in order, repeating the last one
    pub fn new(outcomes: Vec<ProcessOutcome>) -> Self {
        Self {
            rules: Vec::new(),
            default: Mutex::new(outcomes),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always exit with the given code and output
    pub fn exit(code: i32, stdout: &str, stderr: &str) -> Self {
        Self::new(vec![exited(code, stdout, stderr)])
    }

    /// Use `outcome` for targets ending in `suffix`
    pub fn on(mut self, suffix: &str, outcome: ProcessOutcome) -> Self {
        self.rules.push((suffix.to_string(), Script::Outcome(outcome)));
        self
    }

    /// Cancel the run while executing targets ending in `suffix`
    pub fn cancel_on(mut self, suffix: &str) -> Self {
        self.rules.push((suffix.to_string(), Script::CancelRun));
        self
    }

    /// Block targets ending in `suffix` until the run is cancelled
    pub fn block_on(mut self, suffix: &str) -> Self {
        self.rules.push((suffix.to_string(), Script::WaitForCancel));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn next_default(&self) -> ProcessOutcome {
        let mut default = self.default.lock().unwrap();
        if default.len() > 1 {
            default.remove(0)
        } else {
            default
                .first()
                .cloned()
                .unwrap_or_else(|| exited(0, "", ""))
        }
    }
}

/// Shorthand for an `Exited` outcome
pub fn exited(code: i32, stdout: &str, stderr: &str) -> ProcessOutcome {
    ProcessOutcome::Exited {
        code,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(
        &self,
        command: &Path,
        working_dir: &Path,
        args: &[String],
        sink: &dyn OutputSink,
        cancel: &CancellationToken,
    ) -> ProcessOutcome {
        self.calls.lock().unwrap().push(Call {
            command: command.to_path_buf(),
            working_dir: working_dir.to_path_buf(),
            args: args.to_vec(),
        });

        let target = args.last().map(String::as_str).unwrap_or_default();
        let rule = self.rules.iter().find(|(suffix, _)| target.ends_with(suffix.as_str()));

        let outcome = match rule {
            Some((_, Script::Outcome(outcome))) => outcome.clone(),
            Some((_, Script::CancelRun)) => {
                cancel.cancel();
                ProcessOutcome::Cancelled
            }
            Some((_, Script::WaitForCancel)) => {
                cancel.cancelled().await;
                ProcessOutcome::Cancelled
            }
            None => self.next_default(),
        };

        if let ProcessOutcome::Exited { stdout, stderr, .. } = &outcome {
            sink.append(stdout);
            sink.append(stderr);
        }
        outcome
    }
}
