//! Analysis result types shared by the session, cache and HTTP layers.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use chess_core::notation;

/// Engine evaluation from the side to move's point of view.
///
/// `Pawns` is the centipawn score divided by 100. `Mate(n)`: positive n means
/// the side to move mates in n, negative means it gets mated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    Pawns(f64),
    Mate(i32),
}

impl Evaluation {
    pub fn from_centipawns(cp: i32) -> Self {
        Evaluation::Pawns(cp as f64 / 100.0)
    }

    /// A mate score of zero means the side to move is already mated, which
    /// carries no usable evaluation.
    pub fn from_mate(n: i32) -> Option<Self> {
        (n != 0).then_some(Evaluation::Mate(n))
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Pawns(p) => write!(f, "{p}"),
            Evaluation::Mate(n) => write!(f, "#{n}"),
        }
    }
}

// Wire form: a plain number for pawns, "#N" for mates.
impl Serialize for Evaluation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Evaluation::Pawns(p) => serializer.serialize_f64(*p),
            Evaluation::Mate(_) => serializer.serialize_str(&self.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Evaluation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(f64),
            Text(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Number(p) => Ok(Evaluation::Pawns(p)),
            Wire::Text(s) => s
                .strip_prefix('#')
                .and_then(|n| n.parse().ok())
                .map(Evaluation::Mate)
                .ok_or_else(|| de::Error::custom(format!("invalid evaluation '{s}'"))),
        }
    }
}

/// How an engine search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// The engine announced a best move
    Completed,
    /// The deadline passed first
    TimedOut,
    /// The process closed its output or stopped accepting input
    EngineExited,
}

/// Raw result of one engine search, parsed from its output.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineAnalysis {
    /// Best move in UCI notation
    pub best_move: Option<String>,
    pub evaluation: Option<Evaluation>,
    /// Deepest search depth reported
    pub depth: u32,
    pub outcome: SessionOutcome,
}

impl EngineAnalysis {
    pub fn empty(outcome: SessionOutcome) -> Self {
        Self {
            best_move: None,
            evaluation: None,
            depth: 0,
            outcome,
        }
    }
}

/// Analysis of a position as handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub fen: String,
    /// Best move in SAN
    pub best_move: Option<String>,
    pub best_move_uci: Option<String>,
    #[serde(rename = "eval")]
    pub evaluation: Option<Evaluation>,
    pub depth: u32,
    pub outcome: SessionOutcome,
}

impl Analysis {
    pub fn from_engine(fen: &str, engine: EngineAnalysis) -> Self {
        let best_move = engine
            .best_move
            .as_deref()
            .and_then(|code| notation::uci_to_san(fen, code));
        Self {
            fen: fen.to_string(),
            best_move,
            best_move_uci: engine.best_move,
            evaluation: engine.evaluation,
            depth: engine.depth,
            outcome: engine.outcome,
        }
    }

    /// SAN when the engine's move is legal here, otherwise the raw code.
    pub fn best_move_display(&self) -> Option<&str> {
        self.best_move.as_deref().or(self.best_move_uci.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

    #[test]
    fn test_centipawns_become_pawns() {
        assert_eq!(Evaluation::from_centipawns(-10), Evaluation::Pawns(-0.1));
        assert_eq!(Evaluation::from_centipawns(250), Evaluation::Pawns(2.5));
    }

    #[test]
    fn test_mate_zero_is_unusable() {
        assert_eq!(Evaluation::from_mate(0), None);
        assert_eq!(Evaluation::from_mate(-3), Some(Evaluation::Mate(-3)));
    }

    #[test]
    fn test_evaluation_wire_format() {
        assert_eq!(serde_json::to_string(&Evaluation::Pawns(-0.1)).unwrap(), "-0.1");
        assert_eq!(serde_json::to_string(&Evaluation::Mate(3)).unwrap(), "\"#3\"");
        assert_eq!(serde_json::to_string(&Evaluation::Mate(-2)).unwrap(), "\"#-2\"");
        let none: Option<Evaluation> = None;
        assert_eq!(serde_json::to_string(&none).unwrap(), "null");

        let back: Evaluation = serde_json::from_str("\"#-2\"").unwrap();
        assert_eq!(back, Evaluation::Mate(-2));
        assert!(serde_json::from_str::<Evaluation>("\"mate\"").is_err());
    }

    #[test]
    fn test_analysis_converts_best_move() {
        let analysis = Analysis::from_engine(
            AFTER_E4,
            EngineAnalysis {
                best_move: Some("e7e5".to_string()),
                evaluation: Some(Evaluation::from_centipawns(-10)),
                depth: 12,
                outcome: SessionOutcome::Completed,
            },
        );
        assert_eq!(analysis.best_move.as_deref(), Some("e5"));
        assert_eq!(analysis.best_move_uci.as_deref(), Some("e7e5"));

        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["bestMove"], "e5");
        assert_eq!(json["eval"], -0.1);
        assert_eq!(json["outcome"], "completed");
    }

    #[test]
    fn test_illegal_best_move_falls_back_to_code() {
        let analysis = Analysis::from_engine(
            AFTER_E4,
            EngineAnalysis {
                best_move: Some("e2e4".to_string()),
                ..EngineAnalysis::empty(SessionOutcome::Completed)
            },
        );
        assert_eq!(analysis.best_move, None);
        assert_eq!(analysis.best_move_display(), Some("e2e4"));
    }
}
