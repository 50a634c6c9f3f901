use std::env;
use std::time::Duration;

use analysis_engine::EngineConfig;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Commentary is disabled when unset
    pub openrouter_api_key: Option<String>,
    pub commentary_base_url: String,
    pub commentary_model: String,
    pub commentary_timeout: Duration,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8060),
            openrouter_api_key: env::var("OPENROUTER_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            commentary_base_url: env::var("COMMENTARY_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
            commentary_model: env::var("COMMENTARY_MODEL")
                .unwrap_or_else(|_| "openai/gpt-4.1-nano".to_string()),
            commentary_timeout: Duration::from_secs(
                env::var("COMMENTARY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(20),
            ),
            engine: EngineConfig::from_env(),
        }
    }
}
