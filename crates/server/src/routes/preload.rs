use analysis_engine::{preload_game, AnalysisCoordinator, PreloadedPly};
use axum::{extract::rejection::JsonRejection, Extension, Json};
use chess_core::{Game, Side};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreloadRequest {
    pub pgn: String,
    pub user_color: Option<Side>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreloadResponse {
    pub message: String,
    pub preloaded_moves: Vec<PreloadedPly>,
}

/// POST /preload
pub async fn preload(
    Extension(coordinator): Extension<AnalysisCoordinator>,
    payload: Result<Json<PreloadRequest>, JsonRejection>,
) -> Result<Json<PreloadResponse>, AppError> {
    let Json(req) = payload?;
    let game = Game::parse(&req.pgn)?;

    let preloaded_moves = preload_game(&coordinator, &game, req.user_color).await?;

    Ok(Json(PreloadResponse {
        message: format!("Preloaded {} positions", preloaded_moves.len()),
        preloaded_moves,
    }))
}
