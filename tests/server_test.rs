//! HTTP tests for the coaching service.
//!
//! Each test serves the router on an ephemeral port with a fake engine.
#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use analysis_engine::AnalysisCoordinator;
use coach_client::{AnalyzeRequest, CoachClient, Debounced, DebouncedCoach};
use common::{FakeEngine, AFTER_E4, AFTER_E5};
use serde_json::{json, Value};
use server::clients::commentary::CommentaryClient;
use server::config::Config;

/// Serve the app on 127.0.0.1:0 and return its base URL.
async fn spawn_server(engine: &FakeEngine) -> String {
    let mut config = Config::from_env();
    config.openrouter_api_key = None;
    config.engine = engine.config();

    let coordinator = AnalysisCoordinator::from_config(config.engine.clone());
    let commentary = Arc::new(CommentaryClient::new(&config).expect("commentary client"));
    let app = server::routes::build_router(coordinator, commentary);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });
    format!("http://{addr}")
}

fn fake() -> FakeEngine {
    FakeEngine::responsive("info depth 18 score cp -10 pv e7e5", "e7e5")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health() {
    let engine = fake();
    let base = spawn_server(&engine).await;

    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_analyze_move() {
    let engine = fake();
    let base = spawn_server(&engine).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/analyze"))
        .json(&json!({ "pgn": "1. e4 e5", "moveIndex": 2, "userColor": "b" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["input"]["pgn"], "1. e4 e5");
    assert_eq!(body["input"]["fen"], AFTER_E5);
    // Engine's choice before the move, evaluation after it
    assert_eq!(body["stockfish"]["bestMove"], "e5");
    assert_eq!(body["stockfish"]["eval"], -0.1);
    assert_eq!(body["stockfish"]["depth"], 18);
    assert_eq!(body["advice"], Value::Null);
    assert_eq!(body["adviceStatus"], "unavailable");
}

#[tokio::test]
async fn test_analyze_clamps_move_index_past_the_end() {
    let engine = fake();
    let base = spawn_server(&engine).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let resp = client
            .post(format!("{base}/analyze"))
            .json(&json!({ "pgn": "1. e4 e5", "moveIndex": 99 }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["input"]["fen"], AFTER_E5);
    }

    // Both plies clamp to the final position, which is searched once
    assert_eq!(engine.spawns(), 1);
}

#[tokio::test]
async fn test_analyze_missing_move_index() {
    let engine = fake();
    let base = spawn_server(&engine).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/analyze"))
        .json(&json!({ "pgn": "1. e4 e5" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().is_some());
    assert_eq!(engine.spawns(), 0);
}

#[tokio::test]
async fn test_analyze_invalid_game() {
    let engine = fake();
    let base = spawn_server(&engine).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/analyze"))
        .json(&json!({ "pgn": "not a game", "moveIndex": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("Invalid game"));
}

#[tokio::test]
async fn test_preload() {
    let engine = fake();
    let base = spawn_server(&engine).await;
    let client = CoachClient::new(&base).unwrap();

    let resp = client.preload("1. e4", None).await.unwrap();

    assert_eq!(resp.preloaded_moves.len(), 2);
    assert_eq!(resp.preloaded_moves[1].fen, AFTER_E4);
    assert_eq!(resp.preloaded_moves[1].best_move.as_deref(), Some("e5"));
    assert_eq!(resp.preloaded_moves[1].actual_move.as_deref(), Some("e4"));
    assert!(resp.message.contains('2'));
}

#[tokio::test]
async fn test_client_reports_detail() {
    let engine = fake();
    let base = spawn_server(&engine).await;
    let client = CoachClient::new(&base).unwrap();

    let err = client.preload("", None).await.unwrap_err();
    match err {
        coach_client::ClientError::Status { status, detail } => {
            assert_eq!(status, 400);
            assert!(detail.contains("Invalid game"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_debounced_burst_sends_one_request() {
    let engine = fake();
    let base = spawn_server(&engine).await;
    let coach = DebouncedCoach::with_delay(CoachClient::new(&base).unwrap(), Duration::from_millis(50));

    let request = |move_index| AnalyzeRequest {
        pgn: "1. e4 e5".to_string(),
        move_index,
        user_color: None,
        actual_move: None,
    };

    let first = coach.schedule(request(0));
    let second = coach.schedule(request(1));
    let third = coach.schedule(request(2));

    assert!(first.await.is_superseded());
    assert!(second.await.is_superseded());
    let response = third.await.completed().unwrap().unwrap();
    assert_eq!(response.input.fen, AFTER_E5);

    // Only plies 1 and 2 of the last request were searched
    assert_eq!(engine.spawns(), 2);

    // A repeat is answered from the client cache
    match coach.analyze(request(2)).await {
        Debounced::Completed(Ok(again)) => assert_eq!(again, response),
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(engine.spawns(), 2);
}
