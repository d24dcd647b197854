use quadris_engine::{Board, Piece, PieceAction, PieceKind, Weights};

use crate::mcts::NoPlacement;

/// One-ply lookahead bot.
///
/// Tries every placement of the current piece, scores the resulting board,
/// and keeps the best. No randomness and no tree, which makes it fast enough
/// to play the thousands of games a tuning run needs.
///
/// In humanized mode scoring switches to [`Board::humanized_score`], and an
/// I-piece is dropped straight into a four-line clear whenever one exists,
/// before any scoring happens.
#[derive(Debug)]
pub struct GreedyBot {
    board: Board,
    weights: Weights,
    humanized: bool,
}

impl GreedyBot {
    #[must_use]
    pub fn new(weights: Weights, humanized: bool) -> Self {
        Self {
            board: Board::new(),
            weights,
            humanized,
        }
    }

    /// Internal board, updated on every committed placement.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Commits the best-scoring placement for `kind` and returns it.
    ///
    /// Placements that end the game rank below everything else, but one is
    /// still committed when no alternative exists; the caller observes the
    /// terminal board on the next call.
    ///
    /// # Errors
    ///
    /// Returns [`NoPlacement`] when the board is already terminal.
    pub fn decide(&mut self, kind: PieceKind) -> Result<PieceAction, NoPlacement> {
        if self.board.is_terminal() {
            return Err(NoPlacement);
        }
        let mut piece = Piece::new(kind);
        let actions = self.board.actions(&mut piece);

        if self.humanized && kind == PieceKind::I {
            for &action in &actions {
                let mut trial = self.board.clone();
                trial.apply_action(&mut piece, action);
                if trial.is_quad_clear() {
                    self.board = trial;
                    return Ok(action);
                }
            }
        }

        let mut best = None;
        let mut best_value = f32::NEG_INFINITY;
        for &action in &actions {
            let mut trial = self.board.clone();
            trial.apply_action(&mut piece, action);
            let value = if trial.is_terminal() {
                f32::MIN
            } else if self.humanized {
                trial.humanized_score(&self.weights)
            } else {
                trial.score(&self.weights)
            };
            if value > best_value {
                best_value = value;
                best = Some((action, trial));
            }
        }
        let (action, board) = best.ok_or(NoPlacement)?;
        self.board = board;
        Ok(action)
    }
}
