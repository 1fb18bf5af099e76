//! Process runner
//!
//! Launches one external command per call, streams its output to an
//! [`OutputSink`], and reports how it ended. A non-zero exit code is data for
//! the caller, not a runner failure.

mod runner;
mod sink;

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use runner::SubprocessRunner;
pub use sink::{BufferSink, NullSink, OutputSink};

/// How a process run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Terminated normally with a raw exit status
    Exited {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// Killed because the run was cancelled
    Cancelled,
    /// The executable could not be started
    SpawnFailed(String),
    /// Started but could not be observed to a normal exit
    Failed(String),
}

/// Launches external commands
///
/// Arguments are passed as a vector, never through a shell.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        command: &Path,
        working_dir: &Path,
        args: &[String],
        sink: &dyn OutputSink,
        cancel: &CancellationToken,
    ) -> ProcessOutcome;
}
