use serde::{Deserialize, Serialize};

/// Points per lock, indexed by lines cleared, before the level multiplier.
const SCORE_TABLE: [usize; 5] = [0, 100, 300, 500, 800];
/// Cleared lines needed to advance one level.
const LINES_PER_LEVEL: usize = 10;

/// Cumulative score, piece, and line counters for one game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub score: usize,
    pub pieces: usize,
    pub lines: usize,
}

impl GameStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score: 0,
            pieces: 0,
            lines: 0,
        }
    }

    /// Current level; every ten cleared lines advances one.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.lines / LINES_PER_LEVEL
    }

    /// Records one locked piece and the lines it cleared.
    ///
    /// The line bonus is scaled by the level reached after the clear.
    pub const fn record_lock(&mut self, cleared: usize) {
        self.pieces += 1;
        self.lines += cleared;
        self.score += SCORE_TABLE[cleared] * (self.level() + 1);
    }
}
