// src/process/supervisor.rs

//! Spawns a single external process and turns its lifecycle into a
//! [`ProcessOutcome`].

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::log::{ExecutionLogger, LogFields};
use crate::process::outcome::{Invocation, ProcessOutcome};
use crate::process::ProcessRunner;
use crate::types::BoxFuture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    fn as_str(self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }
}

/// How long output may keep trickling in after the child has exited.
///
/// Background processes started by the child can inherit its pipes and keep
/// them open indefinitely; reading stops once no line arrived for this long.
const EXIT_DRAIN_GRACE: Duration = Duration::from_millis(250);

type OutputLine = (OutputStream, String);

/// Production [`ProcessRunner`].
///
/// stdout and stderr are read line by line in their own tasks and funnelled
/// through one channel into the logger, so each stream keeps its own order
/// while the two interleave in arrival order. The child is not killed if the
/// returned future is dropped; once spawned it runs to completion.
///
/// The supervisor is stateless and runs exactly the [`Invocation`] it is
/// given. Which container binary to call (and which helper image to use) is
/// configuration of [`crate::job::ContainerCli`], which receives it through
/// [`crate::config::ContainerConfig`] and builds every invocation from it.
#[derive(Debug, Clone, Default)]
pub struct ProcessSupervisor;

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self
    }

    pub async fn supervise(
        &self,
        invocation: &Invocation,
        logger: &ExecutionLogger,
    ) -> ProcessOutcome {
        info!(
            log_id = %logger.log_id(),
            program = %invocation.program.display(),
            args = ?invocation.args,
            cwd = ?invocation.working_dir,
            "starting process"
        );

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(error) => {
                warn!(
                    log_id = %logger.log_id(),
                    program = %invocation.program.display(),
                    error = %error,
                    "failed to launch process"
                );
                return ProcessOutcome::LaunchFailed { error };
            }
        };

        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<OutputLine>();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, OutputStream::Stdout, line_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, OutputStream::Stderr, line_tx.clone()));
        }
        drop(line_tx);

        // Log output while waiting, so a child blocked on a full pipe still
        // makes progress, and stop waiting as soon as the child itself exits.
        let mut streams_open = true;
        let waited = loop {
            tokio::select! {
                received = line_rx.recv(), if streams_open => match received {
                    Some((stream, line)) => record_line(logger, stream, line).await,
                    None => streams_open = false,
                },
                waited = child.wait() => break waited,
            }
        };
        if streams_open {
            drain_after_exit(&mut line_rx, logger).await;
        }

        let outcome = match waited {
            Ok(status) => ProcessOutcome::from_exit_code(status.code().unwrap_or(-1)),
            Err(error) => ProcessOutcome::LaunchFailed { error },
        };

        info!(
            log_id = %logger.log_id(),
            program = %invocation.program.display(),
            success = outcome.is_success(),
            outcome = %outcome,
            "process exited"
        );

        outcome
    }
}

impl ProcessRunner for ProcessSupervisor {
    fn run<'a>(
        &'a self,
        invocation: &'a Invocation,
        logger: &'a ExecutionLogger,
    ) -> BoxFuture<'a, ProcessOutcome> {
        Box::pin(self.supervise(invocation, logger))
    }
}

async fn record_line(logger: &ExecutionLogger, stream: OutputStream, line: String) {
    let mut fields = LogFields::new();
    fields.insert("stream".to_string(), stream.as_str().to_string());
    if let Err(err) = logger.info_with(line, fields).await {
        warn!(
            log_id = %logger.log_id(),
            error = %err,
            "failed to persist process output line"
        );
    }
}

/// Log what is still buffered once the child has exited.
///
/// Ends at EOF on both streams, or once the streams stay idle for
/// [`EXIT_DRAIN_GRACE`].
async fn drain_after_exit(line_rx: &mut mpsc::UnboundedReceiver<OutputLine>, logger: &ExecutionLogger) {
    loop {
        match timeout(EXIT_DRAIN_GRACE, line_rx.recv()).await {
            Ok(Some((stream, line))) => record_line(logger, stream, line).await,
            Ok(None) => break,
            Err(_) => {
                debug!(
                    log_id = %logger.log_id(),
                    "process output still open after exit, no longer reading it"
                );
                break;
            }
        }
    }
}

/// Read `reader` line by line until EOF and forward every line.
///
/// Invalid UTF-8 is replaced rather than aborting the read, so the pipe is
/// always drained and the child never blocks on a full buffer.
async fn forward_lines<R>(
    reader: R,
    stream: OutputStream,
    tx: mpsc::UnboundedSender<OutputLine>,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\n', '\r'])
                    .to_string();
                if tx.send((stream, line)).is_err() {
                    break;
                }
            }
            Err(err) => {
                debug!(stream = stream.as_str(), error = %err, "stopped reading process output");
                break;
            }
        }
    }
}
