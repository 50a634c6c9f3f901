//! Engine and analysis error types

use thiserror::Error;

/// Hard engine failures. Timeouts and unparsable output are not errors: they
/// come back as an [`EngineAnalysis`](crate::analysis::EngineAnalysis) with
/// nothing in it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Failed to spawn engine: {0}")]
    Spawn(String),

    #[error("Analysis task failed: {0}")]
    Task(String),
}
