//! PGN parsing: a lightweight regex-based move-text parser.
//!
//! Tag pairs are read for metadata and an optional starting FEN; the move
//! text is reduced to SAN tokens which are then replayed for legality.

use std::sync::LazyLock;

use regex::Regex;
use shakmaty::san::SanPlus;
use shakmaty::{Chess, Position};

use crate::error::GameError;
use crate::game::{Game, GameMetadata};
use crate::notation;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("tag regex"));
static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("header regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}|;[^\n]*").expect("comment regex"));
static VARIATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^()]*\)").expect("variation regex"));
static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|[O0]-[O0]-[O0][+#]?|[O0]-[O0][+#]?")
        .expect("move regex")
});

/// Parse PGN text into a validated [`Game`].
pub fn parse_game(text: &str) -> Result<Game, GameError> {
    let mut metadata = GameMetadata::default();
    let mut fen = None;

    for cap in TAG_RE.captures_iter(text) {
        let value = cap[2].to_string();
        match &cap[1] {
            "White" => metadata.white = Some(value),
            "Black" => metadata.black = Some(value),
            "Result" => metadata.result = Some(value),
            "FEN" => fen = Some(value),
            _ => {}
        }
    }

    let tokens = extract_moves(text);
    if tokens.is_empty() {
        return Err(GameError::NoMoves);
    }

    let start = match fen {
        Some(f) => notation::position_from_fen(&f)?,
        None => Chess::default(),
    };

    let mut pos = start.clone();
    let mut moves = Vec::with_capacity(tokens.len());
    let mut san = Vec::with_capacity(tokens.len());

    for (i, token) in tokens.iter().enumerate() {
        let illegal = || GameError::IllegalMove {
            ply: i + 1,
            san: token.clone(),
        };
        let parsed: SanPlus = token.parse().map_err(|_| illegal())?;
        let mv = parsed.san.to_move(&pos).map_err(|_| illegal())?;

        san.push(notation::san_with_suffix(&pos, mv.clone()));
        pos.play_unchecked(mv.clone());
        moves.push(mv);
    }

    Ok(Game::new(metadata, start, moves, san))
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = HEADER_RE.replace_all(pgn, "");
    let mut text = COMMENT_RE.replace_all(&no_headers, "").into_owned();

    // Variations nest, so peel the innermost ones until none are left
    loop {
        let stripped = VARIATION_RE.replace_all(&text, "").into_owned();
        if stripped == text {
            break;
        }
        text = stripped;
    }

    // SAN never contains a zero, so this only rewrites 0-0 / 0-0-0 castling
    MOVE_RE
        .find_iter(&text)
        .map(|m| m.as_str().replace('0', "O"))
        .collect()
}
