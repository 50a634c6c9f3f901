//! Coaching commentary from an OpenAI-compatible chat-completions API.

use analysis_engine::{BoundedCache, CacheKey, Evaluation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::Config;

const SYSTEM_PROMPT: &str =
    "You are my chess coach speaking in first person. Be concise and actionable.";
const MAX_TOKENS: u32 = 120;

#[derive(Debug, thiserror::Error)]
pub enum CommentaryError {
    #[error("Commentary is not configured")]
    Disabled,

    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Empty commentary response")]
    EmptyResponse,
}

/// What the coach is asked to comment on.
#[derive(Debug, Clone)]
pub struct MoveContext<'a> {
    pub played: &'a str,
    /// Engine's preferred move in the position before `played`
    pub engine_best: Option<&'a str>,
    /// Evaluation of the position after `played`
    pub evaluation: Option<Evaluation>,
    pub by_human: bool,
}

impl MoveContext<'_> {
    pub fn prompt(&self) -> String {
        let best = self.engine_best.unwrap_or("unknown");
        let eval = self
            .evaluation
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        if self.by_human {
            format!(
                "I played {}. Engine best move was: {best}. Eval now: {eval}. Give concise advice.",
                self.played
            )
        } else {
            format!(
                "My opponent played {}. Engine best move was: {best}. Eval now: {eval}. \
                 Give concise analysis what the opponent is doing.",
                self.played
            )
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

pub struct CommentaryClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    cache: Mutex<BoundedCache<(CacheKey, String), String>>,
}

impl CommentaryClient {
    pub fn new(config: &Config) -> Result<Self, CommentaryError> {
        let client = Client::builder()
            .user_agent("ChessCoach/1.0")
            .timeout(config.commentary_timeout)
            .build()?;
        Ok(Self {
            client,
            api_key: config.openrouter_api_key.clone(),
            base_url: config.commentary_base_url.trim_end_matches('/').to_string(),
            model: config.commentary_model.clone(),
            cache: Mutex::new(BoundedCache::new(
                config.engine.cache_capacity,
                config.engine.cache_ttl,
            )),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Commentary for the move that led to the position under `key`.
    /// Successful replies are cached per position and played move.
    pub async fn advise(
        &self,
        key: &CacheKey,
        context: &MoveContext<'_>,
    ) -> Result<String, CommentaryError> {
        let cache_key = (key.clone(), context.played.to_string());
        if let Some(advice) = self.cache.lock().await.get(&cache_key) {
            return Ok(advice);
        }

        let advice = self.complete(&context.prompt()).await?;
        self.cache.lock().await.insert(cache_key, advice.clone());
        Ok(advice)
    }

    async fn complete(&self, prompt: &str) -> Result<String, CommentaryError> {
        let api_key = self.api_key.as_deref().ok_or(CommentaryError::Disabled)?;
        tracing::debug!(model = %self.model, prompt, "Requesting commentary");

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: MAX_TOKENS,
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .header("X-Title", "Chess-Coach")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(CommentaryError::Status(resp.status()));
        }

        let reply: ChatResponse = resp.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(CommentaryError::EmptyResponse)
    }
}
