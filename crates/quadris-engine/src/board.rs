use serde::{Deserialize, Serialize};

use crate::piece::CellPos;

/// Playable board width in columns.
pub const BOARD_WIDTH: usize = 10;
/// Total number of rows kept in the state, including the spawn region above
/// the playable area.
pub const TOTAL_HEIGHT: usize = 24;
/// Rows at or above this index end the game when a piece locks into them.
pub const MAX_PLAYABLE_HEIGHT: usize = 20;

/// Mask of a completely filled row.
const FULL_ROW: u16 = (1 << BOARD_WIDTH) - 1;

/// Heuristic weight vector used by [`Board::score`].
///
/// Weights are read at evaluation time, so they can be replaced at any point
/// (the training loop swaps a fresh set in for every game).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    /// Penalty per covered empty cell.
    pub holes: f32,
    /// Penalty per unit of surface unevenness.
    pub bumpiness: f32,
    /// Penalty per row containing at least one covered empty cell.
    pub row_holes: f32,
    /// Reward per line cleared by the most recent lock.
    pub lines: f32,
    /// Optional penalty weight for occupying the leftmost column, used by the
    /// humanized variants to keep a well open for quad clears.
    pub humanized: Option<f32>,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            holes: 1.0,
            bumpiness: 1.0,
            row_holes: 1.0,
            lines: 1.0,
            humanized: None,
        }
    }
}

impl Weights {
    /// Builds a weight vector from a genome slice in gene order
    /// (holes, bumpiness, lines, row holes, optional humanized).
    ///
    /// # Panics
    ///
    /// Panics if the slice has fewer than 4 genes.
    #[must_use]
    pub fn from_genes(genes: &[f32]) -> Self {
        assert!(genes.len() >= 4, "expected at least 4 genes");
        Self {
            holes: genes[0],
            bumpiness: genes[1],
            lines: genes[2],
            row_holes: genes[3],
            humanized: genes.get(4).copied(),
        }
    }
}

/// Bitmask board state.
///
/// Each row is a `u16` with bit `x` set when column `x` is occupied. Row 0 is
/// the bottom of the board; gravity moves pieces toward lower `y`. Rows at or
/// above [`MAX_PLAYABLE_HEIGHT`] are the spawn region: pieces may pass
/// through it freely, but locking a cell there ends the game.
///
/// Cloning copies only the row array plus a few flags and is cheap enough to
/// run on every simulated move; the search layer relies on that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: [u16; TOTAL_HEIGHT],
    cleared_lines: usize,
    terminal: bool,
    quad_clear: bool,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Creates an empty board.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rows: [0; TOTAL_HEIGHT],
            cleared_lines: 0,
            terminal: false,
            quad_clear: false,
        }
    }

    /// Checks whether the given cell is inside the board and unoccupied.
    ///
    /// The spawn region above the playable area counts as free so pieces can
    /// rotate and slide there before dropping.
    #[must_use]
    pub fn is_free(&self, pos: CellPos) -> bool {
        let Ok(x) = usize::try_from(pos.x) else {
            return false;
        };
        let Ok(y) = usize::try_from(pos.y) else {
            return false;
        };
        x < BOARD_WIDTH && y < TOTAL_HEIGHT && (self.rows[y] & (1 << x)) == 0
    }

    /// Locks the four cells of a dropped piece into the board, then clears
    /// any completed rows.
    ///
    /// Locking a cell at or above [`MAX_PLAYABLE_HEIGHT`] marks the board
    /// terminal. [`Self::cleared_lines`] reports the rows removed by this
    /// lock, and [`Self::is_quad_clear`] is set iff exactly 4 rows went away
    /// at once.
    pub fn lock(&mut self, cells: &[CellPos; 4]) {
        for cell in cells {
            let x = usize::try_from(cell.x).expect("locked cell out of bounds");
            let y = usize::try_from(cell.y).expect("locked cell out of bounds");
            if y >= MAX_PLAYABLE_HEIGHT {
                self.terminal = true;
            }
            self.rows[y] |= 1 << x;
        }
        self.clear_full_rows();
    }

    /// Removes full rows, shifting everything above them down while keeping
    /// the relative order of the surviving rows.
    fn clear_full_rows(&mut self) {
        let mut count = 0;
        for y in 0..TOTAL_HEIGHT {
            if self.rows[y] == FULL_ROW {
                count += 1;
                continue;
            }
            if count > 0 {
                self.rows[y - count] = self.rows[y];
            }
        }
        self.rows[TOTAL_HEIGHT - count..].fill(0);

        self.cleared_lines = count;
        self.quad_clear = count == 4;
    }

    /// Number of lines cleared by the most recent lock.
    #[must_use]
    pub fn cleared_lines(&self) -> usize {
        self.cleared_lines
    }

    /// Whether a lock has reached the maximum playable height.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Whether the most recent lock cleared exactly 4 rows simultaneously.
    #[must_use]
    pub fn is_quad_clear(&self) -> bool {
        self.quad_clear
    }

    /// Height of the topmost occupied cell in a column, 0 when empty.
    fn column_height(&self, x: usize) -> usize {
        let mask = 1 << x;
        (0..TOTAL_HEIGHT)
            .rev()
            .find(|&y| (self.rows[y] & mask) != 0)
            .map_or(0, |y| y + 1)
    }

    /// Counts empty cells that have at least one occupied cell above them in
    /// the same column.
    #[must_use]
    pub fn holes(&self) -> usize {
        let mut holes = 0;
        for x in 0..BOARD_WIDTH {
            let mask = 1 << x;
            for y in 0..self.column_height(x) {
                if (self.rows[y] & mask) == 0 {
                    holes += 1;
                }
            }
        }
        holes
    }

    /// Sum of absolute height differences between adjacent columns.
    #[must_use]
    pub fn bumpiness(&self) -> usize {
        let mut bumpiness = 0;
        let mut prev = self.column_height(0);
        for x in 1..BOARD_WIDTH {
            let height = self.column_height(x);
            bumpiness += prev.abs_diff(height);
            prev = height;
        }
        bumpiness
    }

    /// Counts distinct rows containing at least one covered empty cell.
    #[must_use]
    pub fn rows_with_holes(&self) -> usize {
        let mut row_has_hole = [false; TOTAL_HEIGHT];
        for x in 0..BOARD_WIDTH {
            let mask = 1 << x;
            for y in 0..self.column_height(x) {
                if (self.rows[y] & mask) == 0 {
                    row_has_hole[y] = true;
                }
            }
        }
        row_has_hole.iter().filter(|&&h| h).count()
    }

    /// Number of occupied cells in the given column.
    #[must_use]
    pub fn occupied_in_column(&self, x: usize) -> usize {
        assert!(x < BOARD_WIDTH);
        let mask = 1 << x;
        self.rows.iter().filter(|&&row| (row & mask) != 0).count()
    }

    /// Height of the topmost occupied row on the whole board, 0 when empty.
    #[must_use]
    pub fn max_height(&self) -> usize {
        (0..TOTAL_HEIGHT)
            .rev()
            .find(|&y| self.rows[y] != 0)
            .map_or(0, |y| y + 1)
    }

    /// Heuristic value of this state under the given weights.
    ///
    /// Holes, bumpiness, and rows with holes count against the state; lines
    /// cleared by the most recent lock count for it. Higher is better.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn score(&self, weights: &Weights) -> f32 {
        -(weights.holes * self.holes() as f32)
            - (weights.bumpiness * self.bumpiness() as f32)
            - (weights.row_holes * self.rows_with_holes() as f32)
            + (weights.lines * self.cleared_lines as f32)
    }

    /// Like [`Self::score`], with an extra penalty for occupying the
    /// leftmost column.
    ///
    /// The penalty grows as the board fills up, so a nearly full stack is
    /// pushed harder to keep column 0 open for a future quad clear.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn humanized_score(&self, weights: &Weights) -> f32 {
        let fill_ratio = self.max_height().min(MAX_PLAYABLE_HEIGHT) as f32
            / MAX_PLAYABLE_HEIGHT as f32;
        let factor = (weights.humanized.unwrap_or(0.0) + fill_ratio) / 2.0;
        self.score(weights) - self.occupied_in_column(0) as f32 * factor
    }

    /// Creates a `Board` from ASCII art for testing.
    ///
    /// `'#'` is an occupied cell, `'.'` an empty cell. Rows are written top
    /// to bottom and must each have exactly [`BOARD_WIDTH`] cells; missing
    /// rows below [`TOTAL_HEIGHT`] lines are empty.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let mut board = Self::new();
        let lines: Vec<&str> = art.lines().filter(|line| !line.trim().is_empty()).collect();
        assert!(lines.len() <= TOTAL_HEIGHT, "too many rows");

        for (i, line) in lines.iter().enumerate() {
            let y = lines.len() - 1 - i;
            let cells: Vec<char> = line.chars().filter(|c| *c == '#' || *c == '.').collect();
            assert_eq!(
                cells.len(),
                BOARD_WIDTH,
                "each row must have exactly {BOARD_WIDTH} cells, got {} at row {i}",
                cells.len(),
            );
            for (x, &ch) in cells.iter().enumerate() {
                if ch == '#' {
                    board.rows[y] |= 1 << x;
                }
            }
        }
        board
    }
}
