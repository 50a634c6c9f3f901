//! Pool of long-lived engine processes reused between searches.
//!
//! A process is handshaken once when spawned; each later search resets it with
//! `ucinewgame` and waits for `readyok` before setting the position. Processes
//! that miss their deadline are shut down instead of being returned.

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::analysis::{EngineAnalysis, SessionOutcome};
use crate::config::EngineConfig;
use crate::engine::PositionAnalyzer;
use crate::error::EngineError;
use crate::process::EngineProcess;
use crate::protocol;

pub struct EnginePool {
    config: EngineConfig,
    idle: Mutex<Vec<EngineProcess>>,
}

impl EnginePool {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            idle: Mutex::new(Vec::new()),
        }
    }

    /// Number of warm processes waiting for work
    pub async fn idle_count(&self) -> usize {
        self.idle.lock().await.len()
    }

    /// Quit every idle process
    pub async fn shutdown(&self) {
        let processes = std::mem::take(&mut *self.idle.lock().await);
        for mut process in processes {
            process.shutdown(self.config.kill_grace).await;
        }
    }

    async fn checkin(&self, mut process: EngineProcess) {
        let mut idle = self.idle.lock().await;
        if idle.len() < self.config.max_sessions {
            idle.push(process);
            return;
        }
        drop(idle);
        process.shutdown(self.config.kill_grace).await;
    }

    async fn search(
        &self,
        process: &mut EngineProcess,
        fresh: bool,
        fen: &str,
    ) -> Result<(), SessionOutcome> {
        let deadline = Instant::now() + self.config.deadline();

        if fresh {
            send(process, protocol::UCI).await?;
            process
                .wait_for(deadline, |line| line == protocol::UCI_OK)
                .await
                .into_result()?;
            send(process, &protocol::set_option("Hash", self.config.hash_mb)).await?;
            send(process, &protocol::set_option("Threads", self.config.threads)).await?;
        }

        send(process, protocol::NEW_GAME).await?;
        send(process, protocol::IS_READY).await?;
        process
            .wait_for(deadline, |line| line == protocol::READY_OK)
            .await
            .into_result()?;

        send(process, &protocol::position_fen(fen)).await?;
        send(process, &protocol::go_movetime(self.config.movetime.as_millis())).await?;
        let deadline = Instant::now() + self.config.deadline();
        process
            .wait_for(deadline, protocol::is_best_move_line)
            .await
            .into_result()
    }
}

async fn send(process: &mut EngineProcess, cmd: &str) -> Result<(), SessionOutcome> {
    process.send(cmd).await.map_err(|e| {
        warn!(cmd, error = %e, "Failed to write to pooled engine");
        SessionOutcome::EngineExited
    })
}

impl PositionAnalyzer for EnginePool {
    async fn analyze_position(&self, fen: &str) -> Result<EngineAnalysis, EngineError> {
        let reused = self.idle.lock().await.pop();
        let mut attempt = match reused {
            Some(process) => (process, false),
            None => (EngineProcess::spawn(&self.config)?, true),
        };

        loop {
            let (mut process, fresh) = attempt;
            process.take_output();

            let outcome = match self.search(&mut process, fresh, fen).await {
                Ok(()) => SessionOutcome::Completed,
                Err(outcome) => outcome,
            };

            match outcome {
                SessionOutcome::Completed => {
                    let output = process.take_output();
                    self.checkin(process).await;
                    return Ok(protocol::parse_output(&output, outcome));
                }
                // An idle process may have died while waiting; retry once on a fresh one
                SessionOutcome::EngineExited if !fresh => {
                    debug!("Pooled engine went away, spawning a replacement");
                    process.shutdown(self.config.kill_grace).await;
                    attempt = (EngineProcess::spawn(&self.config)?, true);
                }
                _ => {
                    warn!(?outcome, "Pooled engine missed its deadline, discarding it");
                    process.shutdown(self.config.kill_grace).await;
                    return Ok(protocol::parse_output(process.output(), outcome));
                }
            }
        }
    }
}
