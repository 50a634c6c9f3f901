//! Engine configuration from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// How engine processes are managed across requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EngineMode {
    /// A fresh process per analysis, shut down when it finishes
    #[default]
    PerRequest,
    /// Long-lived processes reused through `ucinewgame` / `isready`
    Pooled,
}

impl FromStr for EngineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-request" | "per_request" | "spawn" => Ok(EngineMode::PerRequest),
            "pooled" | "pool" => Ok(EngineMode::Pooled),
            other => Err(format!("unknown engine mode '{other}'")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Path to the UCI engine binary
    pub path: String,

    /// Extra arguments passed to the engine binary
    pub args: Vec<String>,

    /// Hash table size in MB
    pub hash_mb: u32,

    /// Search threads per engine process
    pub threads: u32,

    /// Fixed search time sent with `go movetime`
    pub movetime: Duration,

    /// Slack on top of `movetime` before the search is abandoned
    pub grace: Duration,

    /// How long a process may take to exit after `quit` before it is killed
    pub kill_grace: Duration,

    /// Maximum number of engine processes searching at once
    pub max_sessions: usize,

    pub mode: EngineMode,

    /// Maximum number of cached analyses
    pub cache_capacity: usize,

    /// Cached analyses older than this are dropped
    pub cache_ttl: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: "stockfish".to_string(),
            args: Vec::new(),
            hash_mb: 512,
            threads: num_cpus::get().clamp(1, 4) as u32,
            movetime: Duration::from_millis(2000),
            grace: Duration::from_millis(100),
            kill_grace: Duration::from_millis(500),
            max_sessions: 2,
            mode: EngineMode::PerRequest,
            cache_capacity: 1024,
            cache_ttl: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let path = env::var("STOCKFISH_PATH").unwrap_or(defaults.path);

        let args = env::var("ENGINE_ARGS")
            .map(|v| v.split_whitespace().map(String::from).collect())
            .unwrap_or(defaults.args);

        let mode = match env::var("ENGINE_MODE") {
            Ok(v) => v.parse().unwrap_or_else(|e| {
                warn!(error = %e, "Ignoring ENGINE_MODE");
                defaults.mode
            }),
            Err(_) => defaults.mode,
        };

        Self {
            path,
            args,
            hash_mb: env_or("ENGINE_HASH_MB", defaults.hash_mb),
            threads: env_or("ENGINE_THREADS", defaults.threads),
            movetime: env_millis("ENGINE_MOVETIME_MS").unwrap_or(defaults.movetime),
            grace: env_millis("ENGINE_GRACE_MS").unwrap_or(defaults.grace),
            kill_grace: env_millis("ENGINE_KILL_GRACE_MS").unwrap_or(defaults.kill_grace),
            max_sessions: env_or("ENGINE_MAX_SESSIONS", defaults.max_sessions).max(1),
            mode,
            cache_capacity: env_or("ANALYSIS_CACHE_CAPACITY", defaults.cache_capacity),
            cache_ttl: env::var("ANALYSIS_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs),
        }
    }

    /// Total time a search may run before the session is force-terminated.
    pub fn deadline(&self) -> Duration {
        self.movetime + self.grace
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_millis(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
}
