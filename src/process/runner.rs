//! Subprocess runner built on tokio
//!
//! Spawns one process with an explicit argument vector, forwards stdout and
//! stderr to the output sink chunk by chunk, and captures both streams for
//! the final outcome.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio_util::sync::CancellationToken;

use crate::common::{Error, Result};

use super::sink::OutputSink;
use super::{ProcessOutcome, ProcessRunner};

/// Size of a single read from a child pipe
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// How long to keep reading output after the child has exited
const DRAIN_TIMEOUT: Duration = Duration::from_millis(200);

/// Runs commands as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SubprocessRunner;

impl SubprocessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for SubprocessRunner {
    async fn run(
        &self,
        command: &Path,
        working_dir: &Path,
        args: &[String],
        sink: &dyn OutputSink,
        cancel: &CancellationToken,
    ) -> ProcessOutcome {
        let mut child = match spawn(command, working_dir, args) {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!("Spawn failed: {}", e);
                return ProcessOutcome::SpawnFailed(e.to_string());
            }
        };

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.kill().await;
            return ProcessOutcome::Failed("child pipes were not captured".to_string());
        };
        let mut streams = Streams::new(stdout, stderr);

        // Forward output until the child itself exits
        let status = loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::info!("Cancellation requested; killing {}", command.display());
                    if let Err(e) = child.kill().await {
                        tracing::warn!("Failed to kill cancelled process: {}", e);
                    }
                    let _ = child.wait().await;
                    streams.close(sink);
                    return ProcessOutcome::Cancelled;
                }
                () = streams.pump(sink), if streams.is_open() => {}
                status = child.wait() => break status,
            }
        };

        // Background children may keep the pipes open; only take what is
        // already written
        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while streams.is_open() {
                streams.pump(sink).await;
            }
        })
        .await;
        if drained.is_err() {
            tracing::debug!(
                "{} exited but its output pipes are still open; not waiting",
                command.display()
            );
        }
        streams.close(sink);
        let (out, err) = (streams.out, streams.err);

        let status = match status {
            Ok(status) => status,
            Err(e) => return ProcessOutcome::Failed(format!("failed to wait for process: {}", e)),
        };

        match status.code() {
            Some(code) => {
                tracing::debug!("{} exited with code {}", command.display(), code);
                ProcessOutcome::Exited {
                    code,
                    stdout: out.into_string(),
                    stderr: err.into_string(),
                }
            }
            None => ProcessOutcome::Failed(format!("process terminated without exit code ({})", status)),
        }
    }
}

/// Spawn the child with piped output and no stdin
fn spawn(command: &Path, working_dir: &Path, args: &[String]) -> Result<Child> {
    tracing::debug!(
        "Spawning {} {:?} in {}",
        command.display(),
        args,
        working_dir.display()
    );

    Command::new(command)
        .args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::spawn_failed(&command.display().to_string(), e))
}

/// Both output pipes of a child and what was read from them
struct Streams {
    stdout: ChildStdout,
    stderr: ChildStderr,
    out: StreamCapture,
    err: StreamCapture,
    out_buf: Vec<u8>,
    err_buf: Vec<u8>,
    stdout_open: bool,
    stderr_open: bool,
}

impl Streams {
    fn new(stdout: ChildStdout, stderr: ChildStderr) -> Self {
        Self {
            stdout,
            stderr,
            out: StreamCapture::default(),
            err: StreamCapture::default(),
            out_buf: vec![0u8; READ_CHUNK_SIZE],
            err_buf: vec![0u8; READ_CHUNK_SIZE],
            stdout_open: true,
            stderr_open: true,
        }
    }

    fn is_open(&self) -> bool {
        self.stdout_open || self.stderr_open
    }

    /// Read one chunk from whichever pipe is ready
    ///
    /// Cancel safe: a dropped call loses no bytes.
    async fn pump(&mut self, sink: &dyn OutputSink) {
        tokio::select! {
            read = self.stdout.read(&mut self.out_buf), if self.stdout_open => match read {
                Ok(0) => self.stdout_open = false,
                Ok(n) => self.out.feed(&self.out_buf[..n], sink),
                Err(e) => {
                    tracing::warn!("Failed to read process stdout: {}", e);
                    self.stdout_open = false;
                }
            },
            read = self.stderr.read(&mut self.err_buf), if self.stderr_open => match read {
                Ok(0) => self.stderr_open = false,
                Ok(n) => self.err.feed(&self.err_buf[..n], sink),
                Err(e) => {
                    tracing::warn!("Failed to read process stderr: {}", e);
                    self.stderr_open = false;
                }
            },
            else => {}
        }
    }

    /// Flush partial characters held by the decoders
    fn close(&mut self, sink: &dyn OutputSink) {
        self.out.close(sink);
        self.err.close(sink);
    }
}

/// Captured bytes of one stream plus its incremental decoder
#[derive(Default)]
struct StreamCapture {
    bytes: Vec<u8>,
    decoder: Utf8Decoder,
}

impl StreamCapture {
    fn feed(&mut self, chunk: &[u8], sink: &dyn OutputSink) {
        self.bytes.extend_from_slice(chunk);
        let text = self.decoder.push(chunk);
        if !text.is_empty() {
            sink.append(&text);
        }
    }

    fn close(&mut self, sink: &dyn OutputSink) {
        let rest = self.decoder.finish();
        if !rest.is_empty() {
            sink.append(&rest);
        }
    }

    fn into_string(self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Incremental UTF-8 decoder
///
/// A multi-byte character split across two reads is held back until the
/// rest arrives; invalid bytes become U+FFFD.
#[derive(Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut text = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(valid) => {
                    text.push_str(valid);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    text.push_str(&String::from_utf8_lossy(&self.pending[..valid_up_to]));
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid_up_to + len);
                        }
                        None => {
                            // Incomplete sequence at the end; wait for more bytes
                            self.pending.drain(..valid_up_to);
                            break;
                        }
                    }
                }
            }
        }

        text
    }

    fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::BufferSink;

    #[test]
    fn test_decoder_joins_split_character() {
        let mut decoder = Utf8Decoder::default();
        let bytes = "héllo".as_bytes();
        // 'é' is two bytes, split it across reads
        assert_eq!(decoder.push(&bytes[..2]), "h");
        assert_eq!(decoder.push(&bytes[2..]), "éllo");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.push(b"ok\xffok"), "ok\u{FFFD}ok");
    }

    #[test]
    fn test_decoder_flushes_truncated_tail() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.push(b"a\xc3"), "a");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }

    #[test]
    fn test_capture_forwards_and_accumulates() {
        let sink = BufferSink::new();
        let mut capture = StreamCapture::default();
        capture.feed(b"first ", &sink);
        capture.feed(b"second", &sink);
        capture.close(&sink);

        assert_eq!(sink.contents(), "first second");
        assert_eq!(capture.into_string(), "first second");
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let outcome = SubprocessRunner::new()
            .run(
                Path::new("/definitely/not/a/real/interpreter"),
                Path::new("."),
                &[],
                &BufferSink::new(),
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(outcome, ProcessOutcome::SpawnFailed(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_and_streams() {
        let sink = BufferSink::new();
        let args: Vec<String> = ["-c", "printf out; printf err >&2; exit 3"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let outcome = SubprocessRunner::new()
            .run(Path::new("sh"), Path::new("."), &args, &sink, &CancellationToken::new())
            .await;

        match outcome {
            ProcessOutcome::Exited { code, stdout, stderr } => {
                assert_eq!(code, 3);
                assert_eq!(stdout, "out");
                assert_eq!(stderr, "err");
            }
            other => panic!("Expected Exited outcome, got {:?}", other),
        }
        let shown = sink.contents();
        assert!(shown.contains("out"));
        assert!(shown.contains("err"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_kills_process() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let args = vec!["-c".to_string(), "sleep 30".to_string()];
        let started = std::time::Instant::now();
        let outcome = SubprocessRunner::new()
            .run(Path::new("sh"), Path::new("."), &args, &BufferSink::new(), &cancel)
            .await;

        assert_eq!(outcome, ProcessOutcome::Cancelled);
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_not_held_by_background_child() {
        let args = vec!["-c".to_string(), "sleep 5 & echo done; exit 0".to_string()];
        let started = std::time::Instant::now();
        let outcome = SubprocessRunner::new()
            .run(
                Path::new("sh"),
                Path::new("."),
                &args,
                &BufferSink::new(),
                &CancellationToken::new(),
            )
            .await;

        assert!(started.elapsed() < std::time::Duration::from_secs(3));
        assert_eq!(
            outcome,
            ProcessOutcome::Exited {
                code: 0,
                stdout: "done\n".to_string(),
                stderr: String::new(),
            }
        );
    }
}
