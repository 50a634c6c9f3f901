//! Errors raised while turning input text into a playable game.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("No moves found in game text")]
    NoMoves,

    #[error("Illegal move {san} at ply {ply}")]
    IllegalMove { ply: usize, san: String },

    #[error("Invalid FEN: {0}")]
    InvalidFen(String),
}
