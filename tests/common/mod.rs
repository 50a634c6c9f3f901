#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use analysis_engine::{EngineConfig, EngineMode};

/// Generate a unique suffix from the clock, the process id and a counter.
pub fn unique_suffix() -> String {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!(
        "{}-{}-{}",
        std::process::id(),
        ts % 1_000_000_000,
        COUNTER.fetch_add(1, Ordering::SeqCst)
    )
}

/// Every received line is logged as `< line`, every reply as `> line`, and
/// each start as `spawn`.
const PRELUDE: &str = r#"
log="$1"
echo spawn >> "$log"
reply() { echo "> $1" >> "$log"; echo "$1"; }
"#;

/// A `/bin/sh` script standing in for a UCI engine.
pub struct FakeEngine {
    script: String,
    pub log: PathBuf,
}

impl FakeEngine {
    fn new(body: &str) -> Self {
        let log = std::env::temp_dir().join(format!("fake-engine-{}.log", unique_suffix()));
        std::fs::write(&log, "").unwrap();
        Self {
            script: format!("{PRELUDE}{body}"),
            log,
        }
    }

    /// Answers the handshake at once and every `go` with `info` then
    /// `bestmove`.
    pub fn responsive(info: &str, best_move: &str) -> Self {
        Self::new(&format!(
            r#"
while IFS= read -r line; do
  echo "< $line" >> "$log"
  case "$line" in
    uci) reply "id name FakeFish"; reply "uciok" ;;
    isready) reply "readyok" ;;
    go*) reply "{info}"; reply "bestmove {best_move}" ;;
    quit) exit 0 ;;
  esac
done
"#
        ))
    }

    /// Like `responsive`, but waits before acknowledging `uci`.
    pub fn slow_handshake(delay_secs: &str, info: &str, best_move: &str) -> Self {
        Self::new(&format!(
            r#"
while IFS= read -r line; do
  echo "< $line" >> "$log"
  case "$line" in
    uci) sleep {delay_secs}; reply "uciok" ;;
    isready) reply "readyok" ;;
    go*) reply "{info}"; reply "bestmove {best_move}" ;;
    quit) exit 0 ;;
  esac
done
"#
        ))
    }

    /// Never says anything but exits on `quit`.
    pub fn silent() -> Self {
        Self::new(
            r#"
while IFS= read -r line; do
  echo "< $line" >> "$log"
  case "$line" in
    quit) exit 0 ;;
  esac
done
"#,
        )
    }

    /// Handshakes, then ignores `go` and `quit` alike.
    pub fn stubborn() -> Self {
        Self::new(
            r#"
while IFS= read -r line; do
  echo "< $line" >> "$log"
  case "$line" in
    uci) reply "uciok" ;;
    isready) reply "readyok" ;;
  esac
done
"#,
        )
    }

    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            path: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                self.script.clone(),
                "fake-engine".to_string(),
                self.log.to_string_lossy().into_owned(),
            ],
            hash_mb: 16,
            threads: 1,
            movetime: Duration::from_millis(100),
            grace: Duration::from_millis(900),
            kill_grace: Duration::from_millis(300),
            max_sessions: 2,
            mode: EngineMode::PerRequest,
            cache_capacity: 64,
            cache_ttl: None,
        }
    }

    pub fn log_lines(&self) -> Vec<String> {
        std::fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn spawns(&self) -> usize {
        self.log_lines().iter().filter(|l| *l == "spawn").count()
    }

    /// Position of the first log line matching `pred`.
    pub fn first(&self, pred: impl Fn(&str) -> bool) -> Option<usize> {
        self.log_lines().iter().position(|l| pred(l))
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.log);
    }
}

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
pub const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
pub const AFTER_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
