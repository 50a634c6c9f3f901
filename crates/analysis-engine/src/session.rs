//! Single-use engine session driving one search over UCI.
//!
//! ```text
//! Spawned -> HandshakeSent -> Ready -> PositionSet -> Searching -> Completed
//!     \____________\_____________\_________\______________\-> ForceTerminating
//!                                                                    |
//!                                                              Terminated
//! ```
//!
//! Options and search commands are only written after `uciok`, and the
//! position only after `readyok`. Every wait is bounded by the session
//! deadline; running out of time yields an empty result, not an error.

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::analysis::{EngineAnalysis, SessionOutcome};
use crate::config::EngineConfig;
use crate::engine::PositionAnalyzer;
use crate::error::EngineError;
use crate::process::EngineProcess;
use crate::protocol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Spawned,
    HandshakeSent,
    Ready,
    PositionSet,
    Searching,
    Completed,
    ForceTerminating,
    Terminated,
}

pub struct EngineSession<'a> {
    config: &'a EngineConfig,
    process: EngineProcess,
    state: SessionState,
    deadline: Instant,
}

impl<'a> EngineSession<'a> {
    /// Spawn an engine, search `fen`, and shut the engine down again.
    ///
    /// Only a failure to start the process is an error. Whatever happens
    /// after that, the process is terminated before this returns.
    pub async fn run(config: &'a EngineConfig, fen: &str) -> Result<EngineAnalysis, EngineError> {
        let started = Instant::now();
        let process = EngineProcess::spawn(config)?;
        let mut session = Self {
            config,
            process,
            state: SessionState::Spawned,
            deadline: started + config.deadline(),
        };

        let outcome = match session.drive(fen).await {
            Ok(()) => SessionOutcome::Completed,
            Err(outcome) => outcome,
        };
        let result = session.terminate(outcome).await;

        info!(
            fen,
            best_move = result.best_move.as_deref().unwrap_or("-"),
            depth = result.depth,
            ?outcome,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Engine session finished"
        );
        Ok(result)
    }

    fn enter(&mut self, state: SessionState) {
        debug!(from = ?self.state, to = ?state, "Session state");
        self.state = state;
    }

    async fn send(&mut self, cmd: &str) -> Result<(), SessionOutcome> {
        self.process.send(cmd).await.map_err(|e| {
            warn!(cmd, error = %e, "Failed to write to engine");
            SessionOutcome::EngineExited
        })
    }

    async fn expect(&mut self, pred: impl Fn(&str) -> bool) -> Result<(), SessionOutcome> {
        self.process.wait_for(self.deadline, pred).await.into_result()
    }

    async fn drive(&mut self, fen: &str) -> Result<(), SessionOutcome> {
        self.send(protocol::UCI).await?;
        self.enter(SessionState::HandshakeSent);
        self.expect(|line| line == protocol::UCI_OK).await?;
        self.enter(SessionState::Ready);

        let hash = protocol::set_option("Hash", self.config.hash_mb);
        let threads = protocol::set_option("Threads", self.config.threads);
        self.send(&hash).await?;
        self.send(&threads).await?;
        self.send(protocol::IS_READY).await?;
        self.expect(|line| line == protocol::READY_OK).await?;

        self.send(&protocol::position_fen(fen)).await?;
        self.enter(SessionState::PositionSet);

        self.send(&protocol::go_movetime(self.config.movetime.as_millis()))
            .await?;
        self.deadline = Instant::now() + self.config.deadline();
        self.enter(SessionState::Searching);
        self.expect(protocol::is_best_move_line).await?;

        self.enter(SessionState::Completed);
        Ok(())
    }

    async fn terminate(mut self, outcome: SessionOutcome) -> EngineAnalysis {
        if outcome != SessionOutcome::Completed {
            warn!(state = ?self.state, ?outcome, "No best move before deadline, terminating engine");
            self.enter(SessionState::ForceTerminating);
        }
        self.process.shutdown(self.config.kill_grace).await;
        self.enter(SessionState::Terminated);
        protocol::parse_output(self.process.output(), outcome)
    }
}

/// Runs every analysis in a fresh [`EngineSession`].
#[derive(Clone, Debug)]
pub struct SessionLauncher {
    config: EngineConfig,
}

impl SessionLauncher {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl PositionAnalyzer for SessionLauncher {
    async fn analyze_position(&self, fen: &str) -> Result<EngineAnalysis, EngineError> {
        EngineSession::run(&self.config, fen).await
    }
}
