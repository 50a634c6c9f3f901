use std::sync::Arc;

use analysis_engine::AnalysisCoordinator;
use anyhow::Context;
use server::clients::commentary::CommentaryClient;
use server::config;
use server::routes;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();

    let commentary = Arc::new(CommentaryClient::new(&config)?);
    if commentary.is_enabled() {
        tracing::info!(model = %config.commentary_model, "Commentary configured");
    } else {
        tracing::info!("OPENROUTER_API_KEY not set - commentary disabled");
    }

    let coordinator = AnalysisCoordinator::from_config(config.engine.clone());
    let app = routes::build_router(coordinator.clone(), commentary);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("server error")?;

    coordinator.analyzer().shutdown().await;
    Ok(())
}
