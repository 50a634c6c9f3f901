pub mod error;
pub mod game;
pub mod notation;
pub mod pgn;
pub mod replay;

pub use error::GameError;
pub use game::{Game, GameMetadata, Side};
pub use replay::{position_at, positions, PlyPosition};
