//! Position replay: the board at any ply, derived from the move history.

use serde::Serialize;
use shakmaty::{Chess, Position};

use crate::game::{Game, Side};
use crate::notation;

/// The board after `ply` half-moves of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlyPosition {
    pub ply: usize,
    pub fen: String,
    pub side_to_move: Side,
    /// SAN of the move that produced this position
    pub last_move: Option<String>,
    pub last_mover: Option<Side>,
}

/// Clamp a requested ply into `[0, game.len()]`.
pub fn clamp_ply(game: &Game, ply: i64) -> usize {
    if ply <= 0 {
        0
    } else {
        usize::try_from(ply).map_or(game.len(), |p| p.min(game.len()))
    }
}

/// Position after `ply` half-moves. Out-of-range plies clamp to the start or
/// final position. Replays from the starting position on every call.
pub fn position_at(game: &Game, ply: i64) -> PlyPosition {
    let ply = clamp_ply(game, ply);
    let mut pos = game.start().clone();
    for mv in &game.moves()[..ply] {
        pos.play_unchecked(mv.clone());
    }
    snapshot(game, ply, &pos)
}

/// Every position of the game, ply 0 through the final position.
pub fn positions(game: &Game) -> Vec<PlyPosition> {
    let mut pos = game.start().clone();
    let mut out = Vec::with_capacity(game.len() + 1);
    out.push(snapshot(game, 0, &pos));
    for (i, mv) in game.moves().iter().enumerate() {
        pos.play_unchecked(mv.clone());
        out.push(snapshot(game, i + 1, &pos));
    }
    out
}

fn snapshot(game: &Game, ply: usize, pos: &Chess) -> PlyPosition {
    let side_to_move = Side::from(pos.turn());
    PlyPosition {
        ply,
        fen: notation::to_fen(pos),
        side_to_move,
        last_move: game.san_at(ply).map(str::to_string),
        last_mover: (ply > 0).then(|| side_to_move.other()),
    }
}
