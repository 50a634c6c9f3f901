//! Whole-game preloading to warm the analysis cache.

use chess_core::{positions, Game, Side};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::Evaluation;
use crate::coordinator::{AnalysisCoordinator, SideContext};
use crate::engine::PositionAnalyzer;
use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreloadedPly {
    pub ply: usize,
    pub fen: String,
    /// SAN, or the raw engine code when it is not legal in this position
    pub best_move: Option<String>,
    pub evaluation: Option<Evaluation>,
    pub depth: u32,
    /// The move actually played to reach this ply
    pub actual_move: Option<String>,
}

/// Analyze every ply of `game` in order, one at a time.
///
/// Plies run sequentially so this path never has more than one engine busy.
/// The first failure aborts the batch; no partial list is returned.
pub async fn preload_game<A: PositionAnalyzer>(
    coordinator: &AnalysisCoordinator<A>,
    game: &Game,
    human: Option<Side>,
) -> Result<Vec<PreloadedPly>, EngineError> {
    info!(plies = game.len() + 1, "Preloading game analysis");

    let mut preloaded = Vec::with_capacity(game.len() + 1);
    for position in positions(game) {
        let side = SideContext::for_position(&position, human);
        let analysis = coordinator.analyze_fen(&position.fen, side).await?;

        preloaded.push(PreloadedPly {
            ply: position.ply,
            best_move: analysis.best_move_display().map(str::to_string),
            evaluation: analysis.evaluation,
            depth: analysis.depth,
            actual_move: position.last_move,
            fen: position.fen,
        });
    }

    info!(count = preloaded.len(), "Preloaded game analysis");
    Ok(preloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{EngineAnalysis, SessionOutcome};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replies with the first legal-looking move for white or black, and
    /// fails on the call numbered `fail_at`.
    struct ScriptedAnalyzer {
        calls: AtomicUsize,
        fail_at: Option<usize>,
    }

    impl PositionAnalyzer for ScriptedAnalyzer {
        async fn analyze_position(&self, fen: &str) -> Result<EngineAnalysis, EngineError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_at == Some(call) {
                return Err(EngineError::Spawn("engine missing".into()));
            }
            let white_to_move = fen.split_whitespace().nth(1) == Some("w");
            Ok(EngineAnalysis {
                best_move: Some(if white_to_move { "g1f3" } else { "g8f6" }.into()),
                evaluation: Some(Evaluation::from_centipawns(call as i32)),
                depth: 5,
                outcome: SessionOutcome::Completed,
            })
        }
    }

    fn coordinator(fail_at: Option<usize>) -> AnalysisCoordinator<ScriptedAnalyzer> {
        let analyzer = ScriptedAnalyzer {
            calls: AtomicUsize::new(0),
            fail_at,
        };
        AnalysisCoordinator::new(analyzer, 2, 64, None)
    }

    #[tokio::test]
    async fn test_one_move_game_gives_two_entries() {
        let c = coordinator(None);
        let game = Game::parse("1. e4").unwrap();
        let plies = preload_game(&c, &game, None).await.unwrap();

        assert_eq!(plies.len(), 2);
        assert_eq!(plies[0].ply, 0);
        assert_eq!(plies[0].actual_move, None);
        assert_eq!(plies[0].best_move.as_deref(), Some("Nf3"));
        assert_eq!(plies[1].ply, 1);
        assert_eq!(plies[1].actual_move.as_deref(), Some("e4"));
        assert_eq!(plies[1].best_move.as_deref(), Some("Nf6"));
    }

    #[tokio::test]
    async fn test_results_are_in_ply_order() {
        let c = coordinator(None);
        let game = Game::parse("1. d4 d5 2. c4 e6 3. Nc3").unwrap();
        let plies = preload_game(&c, &game, Some(Side::White)).await.unwrap();

        let order: Vec<usize> = plies.iter().map(|p| p.ply).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
        // Sequential: the nth call scored n centipawns
        for (i, p) in plies.iter().enumerate() {
            assert_eq!(p.evaluation, Some(Evaluation::from_centipawns(i as i32)));
        }
    }

    #[tokio::test]
    async fn test_failure_aborts_batch() {
        let c = coordinator(Some(2));
        let game = Game::parse("1. e4 e5 2. Nf3").unwrap();
        let err = preload_game(&c, &game, None).await.unwrap_err();
        assert!(matches!(err, EngineError::Spawn(_)));
    }

    #[tokio::test]
    async fn test_preload_warms_interactive_lookups() {
        let c = coordinator(None);
        let game = Game::parse("1. e4 e5").unwrap();
        preload_game(&c, &game, Some(Side::Black)).await.unwrap();
        let calls = c.analyzer().calls.load(Ordering::SeqCst);

        let position = chess_core::position_at(&game, 2);
        let side = SideContext::for_position(&position, Some(Side::Black));
        c.analyze(&game, 2, side).await.unwrap();
        assert_eq!(c.analyzer().calls.load(Ordering::SeqCst), calls);
    }
}
