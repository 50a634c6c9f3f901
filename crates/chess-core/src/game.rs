use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Color, Move};

use crate::error::GameError;
use crate::pgn;

/// Side of the board, serialized the way the web client sends it ("w" / "b").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "w", alias = "white")]
    White,
    #[serde(rename = "b", alias = "black")]
    Black,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Side::White => 'w',
            Side::Black => 'b',
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "w" | "white" => Ok(Side::White),
            "b" | "black" => Ok(Side::Black),
            other => Err(format!("unknown side '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: Option<String>,
    pub black: Option<String>,
    pub result: Option<String>, // "1-0", "0-1", "1/2-1/2"
}

/// A game parsed once from PGN move text. Every move has been checked for
/// legality against the starting position, so replaying it cannot fail.
#[derive(Debug, Clone)]
pub struct Game {
    pub metadata: GameMetadata,
    start: Chess,
    moves: Vec<Move>,
    san: Vec<String>,
}

impl Game {
    /// Parse PGN (or bare move text such as `1. e4 e5`).
    pub fn parse(text: &str) -> Result<Self, GameError> {
        pgn::parse_game(text)
    }

    pub(crate) fn new(metadata: GameMetadata, start: Chess, moves: Vec<Move>, san: Vec<String>) -> Self {
        Self {
            metadata,
            start,
            moves,
            san,
        }
    }

    /// Number of plies in the game.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn start(&self) -> &Chess {
        &self.start
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// SAN of every move, including check and mate suffixes.
    pub fn san_moves(&self) -> &[String] {
        &self.san
    }

    /// SAN of the move that produced `ply` (1-based). Ply 0 has no move.
    pub fn san_at(&self, ply: usize) -> Option<&str> {
        ply.checked_sub(1)
            .and_then(|i| self.san.get(i))
            .map(String::as_str)
    }
}
