//! Conversions between engine move codes (UCI) and SAN.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position};

use crate::error::GameError;

/// Build a position from FEN text.
pub fn position_from_fen(fen: &str) -> Result<Chess, GameError> {
    let parsed: Fen = fen
        .trim()
        .parse()
        .map_err(|e| GameError::InvalidFen(format!("{fen}: {e}")))?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| GameError::InvalidFen(format!("{fen}: {e}")))
}

/// FEN of a position, en passant square only when a capture is legal.
pub fn to_fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// SAN of `mv` played from `pos`, with `+` or `#` appended.
pub fn san_with_suffix(pos: &Chess, mv: Move) -> String {
    let mut san = San::from_move(pos, mv.clone()).to_string();
    let mut after = pos.clone();
    after.play_unchecked(mv);
    if after.is_checkmate() {
        san.push('#');
    } else if after.is_check() {
        san.push('+');
    }
    san
}

/// Convert a single UCI move to SAN at a given position.
/// Returns `None` for malformed or illegal codes.
pub fn move_code_to_san(pos: &Chess, code: &str) -> Option<String> {
    let uci_move: UciMove = code.trim().parse().ok()?;
    let legal_move = uci_move.to_move(pos).ok()?;
    Some(san_with_suffix(pos, legal_move))
}

/// Convert a UCI move to SAN given the position as FEN.
pub fn uci_to_san(fen: &str, code: &str) -> Option<String> {
    let pos = position_from_fen(fen).ok()?;
    move_code_to_san(&pos, code)
}
