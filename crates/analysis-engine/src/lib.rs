//! Engine analysis for chess coaching.
//!
//! Positions are searched by an external UCI engine. Each search runs as a
//! bounded session, and an [`AnalysisCoordinator`] sits in front of it with a
//! cache and a limit on concurrent engine processes.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod pool;
pub mod preload;
mod process;
pub mod protocol;
pub mod session;

pub use analysis::{Analysis, EngineAnalysis, Evaluation, SessionOutcome};
pub use cache::BoundedCache;
pub use config::{EngineConfig, EngineMode};
pub use coordinator::{AnalysisCoordinator, CacheKey, SideContext};
pub use engine::{Engine, PositionAnalyzer};
pub use error::EngineError;
pub use pool::EnginePool;
pub use preload::{preload_game, PreloadedPly};
pub use session::{EngineSession, SessionLauncher};
