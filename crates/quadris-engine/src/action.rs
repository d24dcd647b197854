use arrayvec::ArrayVec;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    board::{BOARD_WIDTH, Board},
    piece::Piece,
};

/// Upper bound on placements for one piece: four rotation states, one
/// placement per reachable column.
pub const MAX_ACTIONS: usize = 4 * BOARD_WIDTH;

/// A final placement for a piece: rotate `rotation` times clockwise from
/// spawn, translate so the leftmost cell sits in `column`, then hard-drop.
///
/// Actions are produced by [`Board::actions`] at spawn height and resolved by
/// [`Board::apply_action`] or an external executor driving the live board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceAction {
    /// Rotation index within the piece's distinct rotation range.
    pub rotation: u8,
    /// Target column of the leftmost cell.
    pub column: u8,
}

impl Board {
    /// Enumerates every legal final placement for the piece on this board.
    ///
    /// For each distinct rotation the piece is reset to spawn, rotated,
    /// slid to the left wall, then walked right one reachable column at a
    /// time, recording a placement at every stop. The piece is left reset.
    ///
    /// A non-terminal board always yields at least one placement per
    /// rotation, since the spawn region is open.
    #[must_use]
    pub fn actions(&self, piece: &mut Piece) -> ArrayVec<PieceAction, MAX_ACTIONS> {
        let mut actions = ArrayVec::new();
        for rotation in 0..piece.kind().distinct_rotations() {
            piece.reset();
            for _ in 0..rotation {
                piece.rotate_cw();
            }
            while piece.shift(-1, 0, self) {}
            loop {
                let column = u8::try_from(piece.leftmost_column()).expect("piece in bounds");
                actions.push(PieceAction { rotation, column });
                if !piece.shift(1, 0, self) {
                    break;
                }
            }
        }
        piece.reset();
        debug_assert!(!actions.is_empty() || self.is_terminal());
        actions
    }

    /// Picks a random placement without enumerating all of them.
    ///
    /// Used by rollouts, where full enumeration per ply is too slow. Draws a
    /// rotation and a column, re-drawing the column (bounded attempts) until
    /// the piece can reach it at spawn height. The piece is left reset.
    // TODO: the rotation draw spans 0..3 and never produces the fourth
    // orientation; widen it once the rollout distribution is re-examined.
    pub fn random_action<R>(&self, piece: &mut Piece, rng: &mut R) -> PieceAction
    where
        R: Rng + ?Sized,
    {
        let rotation = rng.random_range(0..3u8);
        for _ in 0..rotation {
            piece.rotate_cw();
        }

        let mut column = rng.random_range(0..BOARD_WIDTH as u8);
        let mut attempts = 0;
        while attempts < 100 {
            let dx = i8::try_from(column).expect("column in range") - piece.leftmost_column();
            if piece.can_shift(dx, 0, self) {
                break;
            }
            column = rng.random_range(0..BOARD_WIDTH as u8);
            attempts += 1;
        }
        piece.reset();
        PieceAction { rotation, column }
    }

    /// Resolves an action: reset, rotate, translate to the target column,
    /// hard-drop, and lock.
    ///
    /// The translation is skipped when the target is unreachable, so the
    /// operation is total; the piece then locks wherever it can fall from
    /// its current column.
    pub fn apply_action(&mut self, piece: &mut Piece, action: PieceAction) {
        piece.reset();
        for _ in 0..action.rotation {
            piece.rotate_cw();
        }
        let dx = i8::try_from(action.column).expect("column in range") - piece.leftmost_column();
        piece.shift(dx, 0, self);
        while piece.shift(0, -1, self) {}
        let cells = *piece.cells();
        self.lock(&cells);
    }
}
