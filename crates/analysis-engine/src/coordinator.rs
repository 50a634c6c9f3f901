//! Analysis coordinator: cache in front of a bounded number of engine searches.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chess_core::{position_at, Game, PlyPosition, Side};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info};

use crate::analysis::Analysis;
use crate::cache::BoundedCache;
use crate::config::EngineConfig;
use crate::engine::{Engine, PositionAnalyzer};
use crate::error::EngineError;

/// Who made the move leading to a position, and which side the human plays.
/// These are the only request details that take part in the cache key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideContext {
    pub mover: Option<Side>,
    pub human: Option<Side>,
}

impl SideContext {
    pub fn new(mover: Option<Side>, human: Option<Side>) -> Self {
        Self { mover, human }
    }

    pub fn for_position(position: &PlyPosition, human: Option<Side>) -> Self {
        Self {
            mover: position.last_mover,
            human,
        }
    }

    /// Whether the move that led here was played by the human
    pub fn is_human_move(&self) -> bool {
        matches!((self.mover, self.human), (Some(m), Some(h)) if m == h)
    }
}

/// Position plus side context. Move numbers are deliberately left out: they
/// do not change what the engine says about a position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub fen: String,
    pub mover: Option<Side>,
    pub human: Option<Side>,
}

impl CacheKey {
    pub fn new(fen: &str, side: SideContext) -> Self {
        Self {
            fen: fen.to_string(),
            mover: side.mover,
            human: side.human,
        }
    }
}

type Pending = Shared<BoxFuture<'static, Result<Analysis, EngineError>>>;

struct Inner<A> {
    analyzer: A,
    cache: Mutex<BoundedCache<CacheKey, Analysis>>,
    in_flight: Mutex<HashMap<CacheKey, Pending>>,
    limiter: Arc<Semaphore>,
}

impl<A: PositionAnalyzer> Inner<A> {
    /// Runs on its own task so an abandoned request still finishes and
    /// fills the cache.
    async fn compute(self: Arc<Self>, key: CacheKey) -> Result<Analysis, EngineError> {
        let result = async {
            let _permit = self
                .limiter
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| EngineError::Task(e.to_string()))?;
            debug!(fen = %key.fen, available = self.limiter.available_permits(), "Engine slot acquired");
            let engine = self.analyzer.analyze_position(&key.fen).await?;
            Ok::<_, EngineError>(Analysis::from_engine(&key.fen, engine))
        }
        .await;

        if let Ok(analysis) = &result {
            self.cache.lock().await.insert(key.clone(), analysis.clone());
            info!(
                fen = %key.fen,
                best_move = analysis.best_move_display().unwrap_or("-"),
                depth = analysis.depth,
                "Analysis cached"
            );
        }
        self.in_flight.lock().await.remove(&key);
        result
    }
}

/// Owns the analysis cache and the engine concurrency limit. Cheap to clone;
/// clones share state.
pub struct AnalysisCoordinator<A = Engine> {
    inner: Arc<Inner<A>>,
}

impl<A> Clone for AnalysisCoordinator<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl AnalysisCoordinator<Engine> {
    /// Coordinator over the engine backend named in `config`.
    pub fn from_config(config: EngineConfig) -> Self {
        let (max_sessions, capacity, ttl) =
            (config.max_sessions, config.cache_capacity, config.cache_ttl);
        Self::new(Engine::from_config(config), max_sessions, capacity, ttl)
    }
}

impl<A: PositionAnalyzer> AnalysisCoordinator<A> {
    pub fn new(
        analyzer: A,
        max_sessions: usize,
        cache_capacity: usize,
        cache_ttl: Option<Duration>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                analyzer,
                cache: Mutex::new(BoundedCache::new(cache_capacity, cache_ttl)),
                in_flight: Mutex::new(HashMap::new()),
                limiter: Arc::new(Semaphore::new(max_sessions.max(1))),
            }),
        }
    }

    pub fn analyzer(&self) -> &A {
        &self.inner.analyzer
    }

    /// Analyze the position at `ply` of `game`. The ply is clamped to the
    /// game's length.
    pub async fn analyze(
        &self,
        game: &Game,
        ply: i64,
        side: SideContext,
    ) -> Result<Analysis, EngineError> {
        let position = position_at(game, ply);
        self.analyze_fen(&position.fen, side).await
    }

    /// Analyze a position given as FEN.
    pub async fn analyze_fen(&self, fen: &str, side: SideContext) -> Result<Analysis, EngineError> {
        let key = CacheKey::new(fen, side);

        let pending = {
            let mut in_flight = self.inner.in_flight.lock().await;

            // Checked under the in-flight lock: a finished computation has
            // always written the cache before clearing its in-flight entry.
            if let Some(hit) = self.inner.cache.lock().await.get(&key) {
                debug!(fen, "Analysis cache hit");
                return Ok(hit);
            }

            match in_flight.get(&key) {
                Some(pending) => {
                    debug!(fen, "Joining in-flight analysis");
                    pending.clone()
                }
                None => {
                    let task = tokio::spawn(Arc::clone(&self.inner).compute(key.clone()));
                    let inner = Arc::clone(&self.inner);
                    let task_key = key.clone();
                    let pending = async move {
                        match task.await {
                            Ok(result) => result,
                            Err(e) => {
                                inner.in_flight.lock().await.remove(&task_key);
                                Err(EngineError::Task(e.to_string()))
                            }
                        }
                    }
                    .boxed()
                    .shared();
                    in_flight.insert(key, pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    pub async fn cache_len(&self) -> usize {
        self.inner.cache.lock().await.len()
    }

    /// Engine slots not currently in use
    pub fn available_sessions(&self) -> usize {
        self.inner.limiter.available_permits()
    }
}
