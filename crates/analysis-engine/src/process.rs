//! Engine child process with line-oriented async I/O

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};

use crate::analysis::SessionOutcome;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::protocol;

/// Result of waiting for a line from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wait {
    Seen,
    TimedOut,
    Closed,
}

impl Wait {
    /// Turn a failed wait into the outcome it forces on the session.
    pub(crate) fn into_result(self) -> Result<(), SessionOutcome> {
        match self {
            Wait::Seen => Ok(()),
            Wait::TimedOut => Err(SessionOutcome::TimedOut),
            Wait::Closed => Err(SessionOutcome::EngineExited),
        }
    }
}

/// A running engine process. Every line read is kept in `output` until
/// taken, so results can be parsed once the search is over.
pub(crate) struct EngineProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    output: Vec<String>,
}

impl EngineProcess {
    pub(crate) fn spawn(config: &EngineConfig) -> Result<Self, EngineError> {
        let mut child = Command::new(&config.path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::Spawn(format!("{}: {e}", config.path)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Spawn("engine stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Spawn("engine stdout not captured".into()))?;

        debug!(pid = child.id(), path = %config.path, "Engine spawned");

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            output: Vec::new(),
        })
    }

    /// Send a command line to the engine
    pub(crate) async fn send(&mut self, cmd: &str) -> std::io::Result<()> {
        debug!(cmd, "UCI <");
        self.stdin.write_all(format!("{cmd}\n").as_bytes()).await?;
        self.stdin.flush().await
    }

    /// Read lines until one matches `pred`, the deadline passes, or the
    /// engine closes its output.
    pub(crate) async fn wait_for(&mut self, deadline: Instant, pred: impl Fn(&str) -> bool) -> Wait {
        loop {
            match timeout_at(deadline, self.stdout.next_line()).await {
                Err(_) => return Wait::TimedOut,
                Ok(Ok(Some(line))) => {
                    let trimmed = line.trim();
                    debug!(line = trimmed, "UCI >");
                    let matched = pred(trimmed);
                    self.output.push(trimmed.to_string());
                    if matched {
                        return Wait::Seen;
                    }
                }
                Ok(Ok(None)) => return Wait::Closed,
                Ok(Err(e)) => {
                    warn!(error = %e, "Failed to read engine output");
                    return Wait::Closed;
                }
            }
        }
    }

    pub(crate) fn output(&self) -> &[String] {
        &self.output
    }

    pub(crate) fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /// Send `quit`, collect whatever the engine still prints, and wait for it
    /// to exit. A process still alive after `kill_grace` is killed.
    pub(crate) async fn shutdown(&mut self, kill_grace: Duration) {
        if let Err(e) = self.send(protocol::QUIT).await {
            debug!(error = %e, "Engine stdin closed before quit");
        }

        let drain = timeout(kill_grace, async {
            while let Ok(Some(line)) = self.stdout.next_line().await {
                self.output.push(line.trim().to_string());
            }
        })
        .await;

        let remaining = if drain.is_ok() { kill_grace } else { Duration::ZERO };
        match timeout(remaining, self.child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "Engine exited"),
            Ok(Err(e)) => warn!(error = %e, "Failed to wait for engine exit"),
            Err(_) => {
                warn!(pid = self.child.id(), "Engine ignored quit, killing");
                if let Err(e) = self.child.kill().await {
                    warn!(error = %e, "Failed to kill engine");
                }
            }
        }
    }
}
