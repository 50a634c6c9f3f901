//! Typed client for the coaching HTTP service.

use std::time::Duration;

use chess_core::Side;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with the service's `detail` message, if any
    #[error("HTTP {status}: {detail}")]
    Status {
        status: reqwest::StatusCode,
        detail: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub pgn: String,
    pub move_index: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_color: Option<Side>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_move: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalyzeInput {
    pub pgn: String,
    pub fen: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSummary {
    pub best_move: Option<String>,
    /// A number of pawns, a `"#N"` mate string, or null
    pub eval: Value,
    pub depth: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub input: AnalyzeInput,
    pub stockfish: EngineSummary,
    pub advice: Option<String>,
    pub advice_status: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreloadedMove {
    pub ply: usize,
    pub fen: String,
    pub best_move: Option<String>,
    pub evaluation: Value,
    pub depth: u32,
    pub actual_move: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreloadResponse {
    pub message: String,
    pub preloaded_moves: Vec<PreloadedMove>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PreloadBody<'a> {
    pgn: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_color: Option<Side>,
}

#[derive(Clone)]
pub struct CoachClient {
    client: Client,
    base_url: String,
}

impl CoachClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent("ChessCoach/1.0")
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, ClientError> {
        let resp = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .json(request)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn preload(
        &self,
        pgn: &str,
        user_color: Option<Side>,
    ) -> Result<PreloadResponse, ClientError> {
        let resp = self
            .client
            .post(format!("{}/preload", self.base_url))
            .json(&PreloadBody { pgn, user_color })
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or(body);
    Err(ClientError::Status { status, detail })
}
