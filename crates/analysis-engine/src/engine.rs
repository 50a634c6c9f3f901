//! The seam between the coordinator and whatever runs the engine.

use std::future::Future;

use tracing::info;

use crate::analysis::EngineAnalysis;
use crate::config::{EngineConfig, EngineMode};
use crate::error::EngineError;
use crate::pool::EnginePool;
use crate::session::SessionLauncher;

/// Something that can search a position and report the result.
///
/// Returns `impl Future + Send` so the coordinator can run analyses on
/// detached tokio tasks.
pub trait PositionAnalyzer: Send + Sync + 'static {
    fn analyze_position(
        &self,
        fen: &str,
    ) -> impl Future<Output = Result<EngineAnalysis, EngineError>> + Send;
}

/// Engine backend picked from [`EngineConfig::mode`].
pub enum Engine {
    PerRequest(SessionLauncher),
    Pooled(EnginePool),
}

impl Engine {
    pub fn from_config(config: EngineConfig) -> Self {
        info!(path = %config.path, mode = ?config.mode, "Engine backend configured");
        match config.mode {
            EngineMode::PerRequest => Engine::PerRequest(SessionLauncher::new(config)),
            EngineMode::Pooled => Engine::Pooled(EnginePool::new(config)),
        }
    }

    /// Quit any processes kept alive between requests.
    pub async fn shutdown(&self) {
        if let Engine::Pooled(pool) = self {
            pool.shutdown().await;
        }
    }
}

impl PositionAnalyzer for Engine {
    async fn analyze_position(&self, fen: &str) -> Result<EngineAnalysis, EngineError> {
        match self {
            Engine::PerRequest(launcher) => launcher.analyze_position(fen).await,
            Engine::Pooled(pool) => pool.analyze_position(fen).await,
        }
    }
}
