pub mod analyze;
pub mod health;
pub mod preload;

use std::sync::Arc;

use analysis_engine::AnalysisCoordinator;
use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::clients::commentary::CommentaryClient;

pub fn build_router(coordinator: AnalysisCoordinator, commentary: Arc<CommentaryClient>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/analyze", post(analyze::analyze))
        .route("/preload", post(preload::preload))
        .layer(Extension(coordinator))
        .layer(Extension(commentary))
        .layer(cors)
}
