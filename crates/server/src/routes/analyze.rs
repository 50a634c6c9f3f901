use std::sync::Arc;

use analysis_engine::{AnalysisCoordinator, CacheKey, Evaluation, SideContext};
use axum::{extract::rejection::JsonRejection, Extension, Json};
use chess_core::{position_at, Game, Side};
use serde::{Deserialize, Serialize};

use crate::clients::commentary::{CommentaryClient, MoveContext};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub pgn: String,
    /// Ply reached by the move under review; out-of-range values are clamped
    pub move_index: i64,
    pub user_color: Option<Side>,
    pub actual_move: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeInput {
    pub pgn: String,
    pub fen: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSummary {
    /// Engine's choice in the position before the move
    pub best_move: Option<String>,
    /// Evaluation of the position after the move
    pub eval: Option<Evaluation>,
    pub depth: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceStatus {
    Ok,
    Unavailable,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub input: AnalyzeInput,
    pub stockfish: EngineSummary,
    pub advice: Option<String>,
    pub advice_status: AdviceStatus,
}

/// POST /analyze
pub async fn analyze(
    Extension(coordinator): Extension<AnalysisCoordinator>,
    Extension(commentary): Extension<Arc<CommentaryClient>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(req) = payload?;
    if req.pgn.trim().is_empty() {
        return Err(AppError::BadRequest("pgn and moveIndex required".into()));
    }

    let game = Game::parse(&req.pgn)?;
    let before_ply = req.move_index.saturating_sub(1);
    let before = position_at(&game, before_ply);
    let after = position_at(&game, req.move_index);
    let before_side = SideContext::for_position(&before, req.user_color);
    let after_side = SideContext::for_position(&after, req.user_color);

    let (previous, current) = tokio::try_join!(
        coordinator.analyze(&game, before_ply, before_side),
        coordinator.analyze(&game, req.move_index, after_side),
    )?;
    let best_move = previous.best_move_display().map(str::to_string);

    let played = req.actual_move.or_else(|| after.last_move.clone());
    let (advice, advice_status) = match played.as_deref() {
        Some(played) => {
            let context = MoveContext {
                played,
                engine_best: best_move.as_deref(),
                evaluation: current.evaluation,
                by_human: after_side.is_human_move(),
            };
            let key = CacheKey::new(&after.fen, after_side);
            match commentary.advise(&key, &context).await {
                Ok(advice) => (Some(advice), AdviceStatus::Ok),
                Err(e) => {
                    tracing::warn!(error = %e, ply = after.ply, "Commentary unavailable");
                    (None, AdviceStatus::Unavailable)
                }
            }
        }
        None => (None, AdviceStatus::Unavailable),
    };

    tracing::info!(
        ply = after.ply,
        best_move = ?best_move,
        eval = ?current.evaluation,
        ?advice_status,
        "Analyzed move"
    );

    Ok(Json(AnalyzeResponse {
        input: AnalyzeInput {
            pgn: req.pgn,
            fen: after.fen,
        },
        stockfish: EngineSummary {
            best_move,
            eval: current.evaluation,
            depth: current.depth,
        },
        advice,
        advice_status,
    }))
}
