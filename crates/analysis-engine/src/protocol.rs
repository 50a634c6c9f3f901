//! UCI commands and output parsing

use tracing::warn;

use crate::analysis::{EngineAnalysis, Evaluation, SessionOutcome};

pub const UCI: &str = "uci";
pub const UCI_OK: &str = "uciok";
pub const IS_READY: &str = "isready";
pub const READY_OK: &str = "readyok";
pub const NEW_GAME: &str = "ucinewgame";
pub const QUIT: &str = "quit";

pub fn set_option(name: &str, value: impl std::fmt::Display) -> String {
    format!("setoption name {name} value {value}")
}

pub fn position_fen(fen: &str) -> String {
    format!("position fen {fen}")
}

pub fn go_movetime(millis: u128) -> String {
    format!("go movetime {millis}")
}

pub fn is_best_move_line(line: &str) -> bool {
    line.split_whitespace().next() == Some("bestmove")
}

/// Score reported on an `info` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub score: Option<Score>,
}

/// Check for a 4 or 5 character move code: from-square, to-square and an
/// optional promotion piece.
pub fn is_move_code(code: &str) -> bool {
    let b = code.as_bytes();
    let square = |f: u8, r: u8| (b'a'..=b'h').contains(&f) && (b'1'..=b'8').contains(&r);
    match b.len() {
        4 => square(b[0], b[1]) && square(b[2], b[3]),
        5 => square(b[0], b[1]) && square(b[2], b[3]) && b"qrbn".contains(&b[4]),
        _ => false,
    }
}

/// Parse the move from a `bestmove` line. `(none)`, `0000` and malformed
/// codes give `None`.
pub fn parse_best_move(line: &str) -> Option<String> {
    let mut parts = line.split_whitespace();
    if parts.next() != Some("bestmove") {
        return None;
    }
    parts
        .next()
        .filter(|code| is_move_code(code))
        .map(String::from)
}

/// Parse depth and score from an `info` line
pub fn parse_info(line: &str) -> Option<InfoLine> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.first() != Some(&"info") {
        return None;
    }

    let value_after = |key: &str| {
        parts
            .iter()
            .position(|p| *p == key)
            .and_then(|i| parts.get(i + 1))
    };

    let depth = value_after("depth").and_then(|v| v.parse().ok());

    let score = parts.iter().position(|p| *p == "score").and_then(|i| {
        let kind = parts.get(i + 1)?;
        let value: i32 = parts.get(i + 2)?.parse().ok()?;
        match *kind {
            "cp" => Some(Score::Centipawns(value)),
            "mate" => Some(Score::Mate(value)),
            _ => None,
        }
    });

    Some(InfoLine { depth, score })
}

/// Lines an engine prints while initializing; they never carry results.
fn is_handshake_noise(line: &str) -> bool {
    line.is_empty()
        || line == UCI_OK
        || line == READY_OK
        || line.starts_with("id ")
        || line.starts_with("option ")
        || line.starts_with("info string")
}

/// Parse a finished session's output. Called once per search.
///
/// The last `bestmove` line wins. Only a line reaching a strictly deeper
/// depth replaces the evaluation, so shallower re-searches never overwrite
/// a deeper score.
pub fn parse_output<S: AsRef<str>>(lines: &[S], outcome: SessionOutcome) -> EngineAnalysis {
    let mut result = EngineAnalysis::empty(outcome);
    let mut scored_depth: Option<u32> = None;
    let mut recognized = false;
    let mut meaningful = false;

    for line in lines {
        let line = line.as_ref().trim();
        if !is_handshake_noise(line) {
            meaningful = true;
        }

        if is_best_move_line(line) {
            recognized = true;
            result.best_move = parse_best_move(line);
            if result.best_move.is_none() {
                let code = line.split_whitespace().nth(1).unwrap_or("");
                if code != "(none)" && code != "0000" {
                    warn!(line, "Unrecognized move code in bestmove line");
                }
            }
            continue;
        }

        let Some(info) = parse_info(line) else {
            continue;
        };
        let Some(depth) = info.depth else {
            continue;
        };
        result.depth = result.depth.max(depth);

        let Some(score) = info.score else {
            continue;
        };
        recognized = true;
        if scored_depth.is_some_and(|d| depth <= d) {
            continue;
        }
        scored_depth = Some(depth);
        result.evaluation = match score {
            Score::Centipawns(cp) => Some(Evaluation::from_centipawns(cp)),
            Score::Mate(n) => Evaluation::from_mate(n),
        };
    }

    if meaningful && !recognized {
        warn!(
            lines = lines.len(),
            ?outcome,
            "Engine output had no best move or score, treating evaluation as absent"
        );
    }

    result
}
