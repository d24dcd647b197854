use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use crate::board::Board;

/// Column where pieces spawn (position of the pivot cell).
pub(crate) const SPAWN_X: i8 = 4;
/// Row where pieces spawn, inside the hidden region above the playable area.
pub(crate) const SPAWN_Y: i8 = 21;

/// Absolute cell coordinate on the board.
///
/// `x` grows rightward, `y` grows upward; row 0 is the board floor.
/// Coordinates are signed so intermediate rotation and translation results
/// can leave the board before the bounds check rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPos {
    pub x: i8,
    pub y: i8,
}

impl CellPos {
    #[must_use]
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }
}

/// Enum representing the type of piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// O-piece.
    O = 1,
    /// S-piece.
    S = 2,
    /// Z-piece.
    Z = 3,
    /// J-piece.
    J = 4,
    /// L-piece.
    L = 5,
    /// T-piece.
    T = 6,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        match rng.random_range(0..PieceKind::LEN) {
            0 => PieceKind::I,
            1 => PieceKind::O,
            2 => PieceKind::S,
            3 => PieceKind::Z,
            4 => PieceKind::J,
            5 => PieceKind::L,
            _ => PieceKind::T,
        }
    }
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    /// Relative cell offsets from the pivot at spawn orientation.
    ///
    /// The first entry is the pivot itself; rotation happens about it.
    #[must_use]
    pub(crate) const fn spawn_offsets(self) -> [(i8, i8); 4] {
        match self {
            PieceKind::I => [(0, 0), (-1, 0), (2, 0), (1, 0)],
            PieceKind::O => [(0, 0), (1, 0), (1, 1), (0, 1)],
            PieceKind::S => [(0, 0), (-1, 0), (1, 1), (0, 1)],
            PieceKind::Z => [(0, 0), (0, 1), (-1, 1), (1, 0)],
            PieceKind::J => [(0, 0), (-1, 0), (-1, 1), (1, 0)],
            PieceKind::L => [(0, 0), (-1, 0), (1, 1), (1, 0)],
            PieceKind::T => [(0, 0), (-1, 0), (0, 1), (1, 0)],
        }
    }

    /// Number of rotation states that produce distinct placements.
    ///
    /// The square is symmetric under every rotation, I/S/Z under 180
    /// degrees, and the remaining shapes need all four states.
    #[must_use]
    pub const fn distinct_rotations(self) -> u8 {
        match self {
            PieceKind::O => 1,
            PieceKind::I | PieceKind::S | PieceKind::Z => 2,
            PieceKind::J | PieceKind::L | PieceKind::T => 4,
        }
    }

    /// Returns the single character representation of this piece kind.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::T => 'T',
        }
    }

    /// Parses a piece kind from a single character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            'T' => Some(PieceKind::T),
            _ => None,
        }
    }
}

/// A tetromino as four absolute cells on the board.
///
/// The spawn cells are fixed at construction; [`Self::reset`] snaps the
/// current cells back to them in place, which the action generator relies on
/// between trial placements (no reallocation).
///
/// Rotation multiplies the cell offsets relative to the pivot (the first
/// cell) by a fixed 2x2 matrix. There is no wall-kick offset correction: a
/// rotation that would overlap the stack or the walls is simply rejected by
/// the movement checks, which can differ from rotation systems that nudge
/// the piece free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    spawn_cells: [CellPos; 4],
    cells: [CellPos; 4],
}

impl Piece {
    /// Creates a piece of the given kind at the spawn position.
    #[must_use]
    pub fn new(kind: PieceKind) -> Self {
        let mut spawn_cells = [CellPos::new(0, 0); 4];
        for (cell, (dx, dy)) in spawn_cells.iter_mut().zip(kind.spawn_offsets()) {
            *cell = CellPos::new(SPAWN_X + dx, SPAWN_Y + dy);
        }
        Self {
            kind,
            spawn_cells,
            cells: spawn_cells,
        }
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    /// Current absolute cells of the piece.
    #[must_use]
    pub fn cells(&self) -> &[CellPos; 4] {
        &self.cells
    }

    /// Snaps the piece back to its spawn cells.
    pub fn reset(&mut self) {
        self.cells = self.spawn_cells;
    }

    /// Column of the leftmost cell.
    #[must_use]
    pub fn leftmost_column(&self) -> i8 {
        self.cells.iter().map(|c| c.x).min().unwrap()
    }

    /// Rotates 90 degrees clockwise about the pivot cell, unconditionally.
    pub fn rotate_cw(&mut self) {
        self.rotate(|dx, dy| (dy, -dx));
    }

    /// Rotates 90 degrees counterclockwise about the pivot cell,
    /// unconditionally.
    pub fn rotate_ccw(&mut self) {
        self.rotate(|dx, dy| (-dy, dx));
    }

    fn rotate(&mut self, matrix: impl Fn(i8, i8) -> (i8, i8)) {
        let pivot = self.cells[0];
        for cell in &mut self.cells {
            let (dx, dy) = (cell.x - pivot.x, cell.y - pivot.y);
            let (rx, ry) = matrix(dx, dy);
            *cell = CellPos::new(pivot.x + rx, pivot.y + ry);
        }
    }

    /// Checks whether every cell would stay in-bounds and unoccupied after
    /// translating by `(dx, dy)`.
    #[must_use]
    pub fn can_shift(&self, dx: i8, dy: i8, board: &Board) -> bool {
        self.cells
            .iter()
            .all(|cell| board.is_free(CellPos::new(cell.x + dx, cell.y + dy)))
    }

    /// Translates by `(dx, dy)` if the destination is legal.
    ///
    /// Returns whether the piece moved.
    pub fn shift(&mut self, dx: i8, dy: i8, board: &Board) -> bool {
        if !self.can_shift(dx, dy, board) {
            return false;
        }
        for cell in &mut self.cells {
            cell.x += dx;
            cell.y += dy;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_random_sampling_reaches_every_kind() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut seen = [false; PieceKind::LEN];
        for _ in 0..200 {
            let kind: PieceKind = rng.random();
            seen[kind as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_spawn_cells_form_shape_in_spawn_region() {
        for kind in [
            PieceKind::I,
            PieceKind::O,
            PieceKind::S,
            PieceKind::Z,
            PieceKind::J,
            PieceKind::L,
            PieceKind::T,
        ] {
            let piece = Piece::new(kind);
            for cell in piece.cells() {
                assert!(cell.x >= 0 && cell.x < 10, "{kind:?} spawns in bounds");
                assert!(cell.y >= 21, "{kind:?} spawns above the playable area");
            }
        }
    }

    #[test]
    fn test_reset_restores_spawn_cells() {
        let board = Board::new();
        let mut piece = Piece::new(PieceKind::T);
        let spawn = *piece.cells();
        piece.rotate_cw();
        assert!(piece.shift(-2, 0, &board));
        assert_ne!(*piece.cells(), spawn);
        piece.reset();
        assert_eq!(*piece.cells(), spawn);
    }

    #[test]
    fn test_four_clockwise_rotations_are_identity() {
        let mut piece = Piece::new(PieceKind::J);
        let spawn = *piece.cells();
        for _ in 0..4 {
            piece.rotate_cw();
        }
        assert_eq!(*piece.cells(), spawn);
    }

    #[test]
    fn test_ccw_undoes_cw() {
        let mut piece = Piece::new(PieceKind::L);
        let spawn = *piece.cells();
        piece.rotate_cw();
        piece.rotate_ccw();
        assert_eq!(*piece.cells(), spawn);
    }

    #[test]
    fn test_shift_blocked_at_wall() {
        let board = Board::new();
        let mut piece = Piece::new(PieceKind::O);
        let mut steps = 0;
        while piece.shift(-1, 0, &board) {
            steps += 1;
        }
        assert_eq!(piece.leftmost_column(), 0);
        assert_eq!(steps, 4);
        assert!(!piece.can_shift(-1, 0, &board));
    }

    #[test]
    fn test_shift_blocked_by_stack() {
        let art: String = (0..12).map(|_| "#####.....\n").collect();
        let board = Board::from_ascii(&art);
        let mut piece = Piece::new(PieceKind::O);
        // Drop to the floor just right of the stack, then try to slide into it.
        assert!(piece.shift(1, 0, &board));
        while piece.shift(0, -1, &board) {}
        assert!(piece.cells().iter().all(|c| c.y <= 1));
        assert!(!piece.can_shift(-1, 0, &board));
    }

    #[test]
    fn test_distinct_rotation_counts() {
        assert_eq!(PieceKind::O.distinct_rotations(), 1);
        assert_eq!(PieceKind::I.distinct_rotations(), 2);
        assert_eq!(PieceKind::S.distinct_rotations(), 2);
        assert_eq!(PieceKind::Z.distinct_rotations(), 2);
        assert_eq!(PieceKind::J.distinct_rotations(), 4);
        assert_eq!(PieceKind::L.distinct_rotations(), 4);
        assert_eq!(PieceKind::T.distinct_rotations(), 4);
    }

    #[test]
    fn test_piece_kind_char_round_trip() {
        for c in ['I', 'O', 'S', 'Z', 'J', 'L', 'T'] {
            let kind = PieceKind::from_char(c).unwrap();
            assert_eq!(kind.as_char(), c);
        }
        assert_eq!(PieceKind::from_char('X'), None);
    }
}
