use std::time::{Duration, Instant};

use quadris_engine::{Board, Piece, PieceAction, PieceKind, Weights};
use rand::Rng;

use crate::tree::{NodeId, SearchTree};

/// Geometric weight applied to each successive rollout ply.
const ROLLOUT_DECAY: f32 = 0.5;

/// Returned when a decision is requested but no placement can be
/// recommended, which happens once the board is terminal.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("no legal placement available")]
pub struct NoPlacement;

/// Monte Carlo tree search bot with a tree that persists across turns.
///
/// The bot keeps an append-only queue of upcoming piece kinds and an internal
/// board that mirrors the game. Each [`Self::decide`] call searches under a
/// wall-clock budget, commits the best placement, and promotes the chosen
/// child to root so its statistics carry over to the next turn.
///
/// Search runs as repeated steps over a rolling node that descends from the
/// root: every child of the rolling node gets one rollout, rewards propagate
/// up to the root, and the UCT-best child either becomes the next rolling
/// node or is expanded one level deeper.
#[derive(Debug)]
pub struct MctsBot<R> {
    tree: SearchTree,
    board: Board,
    pieces: Vec<PieceKind>,
    weights: Weights,
    humanized: bool,
    rolling: NodeId,
    rollouts: u64,
    rng: R,
}

impl<R> MctsBot<R>
where
    R: Rng,
{
    /// Creates a bot for the given board and known upcoming pieces.
    ///
    /// The initial tree is built breadth-first down to the end of the piece
    /// queue, stopping early when `build_budget` runs out.
    pub fn new(board: Board, initial_pieces: &[PieceKind], build_budget: Duration, rng: R) -> Self {
        let mut tree = SearchTree::new(board.clone());
        tree.build(initial_pieces, Instant::now() + build_budget);
        let rolling = tree.root();
        Self {
            tree,
            board,
            pieces: initial_pieces.to_vec(),
            weights: Weights::default(),
            humanized: false,
            rolling,
            rollouts: 0,
            rng,
        }
    }

    pub fn set_weights(&mut self, weights: Weights) {
        self.weights = weights;
    }

    /// Switches rollout scoring to the humanized evaluation, which penalizes
    /// filling the leftmost column.
    pub fn set_humanized(&mut self, humanized: bool) {
        self.humanized = humanized;
    }

    /// Appends a newly revealed piece to the lookahead queue.
    pub fn notify_piece(&mut self, kind: PieceKind) {
        self.pieces.push(kind);
    }

    /// Internal board mirror, updated on every committed placement.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Total rollouts simulated so far, across all turns.
    #[must_use]
    pub fn rollouts(&self) -> u64 {
        self.rollouts
    }

    /// Searches under the given wall-clock budget and commits the best
    /// placement for `piece`, which must be the next piece in the queue.
    ///
    /// A root child that clears four lines at once is committed as soon as it
    /// is discovered, without waiting for the budget to run out.
    ///
    /// # Errors
    ///
    /// Returns [`NoPlacement`] when the board is terminal.
    pub fn decide(&mut self, piece: PieceKind, budget: Duration) -> Result<PieceAction, NoPlacement> {
        if self.board.is_terminal() {
            return Err(NoPlacement);
        }
        let deadline = Instant::now() + budget;
        self.begin_turn(piece);
        while Instant::now() < deadline {
            if let Some(winning) = self.search_step() {
                return self.commit(winning);
            }
        }
        let best = self.tree.recommended_child(self.tree.root()).ok_or(NoPlacement)?;
        self.commit(best)
    }

    fn begin_turn(&mut self, piece: PieceKind) {
        let root = self.tree.root();
        let depth = self.tree.node(root).depth;
        if self.pieces.len() == depth {
            self.pieces.push(piece);
        }
        debug_assert_eq!(self.pieces.get(depth), Some(&piece));
        if self.tree.children(root).is_empty() && !self.board.is_terminal() {
            self.tree.expand(root, piece);
        }
        self.rolling = root;
    }

    /// Runs one search step at the rolling node. Returns a root child whose
    /// placement clears four lines, if one is found.
    fn search_step(&mut self) -> Option<NodeId> {
        let rolling = self.rolling;
        let root = self.tree.root();
        let children = self.tree.children(rolling).to_vec();

        let mut quad = None;
        for child in children {
            if self.tree.node(child).board.is_quad_clear() {
                quad = Some(child);
                break;
            }
            if self.tree.node(child).board.is_terminal() {
                // Terminal placements only accrue visits; there is no reward
                // to propagate.
                self.tree.record_visit(child, 0.0);
                continue;
            }
            let reward = self.rollout(child);
            self.tree.record_visit(child, reward);
            self.tree.backpropagate(rolling, reward);
        }

        if let Some(win) = quad {
            if rolling == root {
                return Some(win);
            }
            // A deep quad clear is not committable yet; reward the path that
            // leads to it and restart the descent.
            let reward = self.score_board(&self.tree.node(win).board);
            self.tree.record_visit(win, reward);
            self.tree.backpropagate(rolling, reward);
            self.rolling = root;
            return None;
        }

        let Some(best) = self.tree.best_child_uct(rolling) else {
            self.rolling = root;
            return None;
        };
        if self.tree.children(best).is_empty() {
            let node = self.tree.node(best);
            let depth = node.depth;
            if depth < self.pieces.len() && !node.board.is_terminal() {
                let kind = self.pieces[depth];
                self.tree.expand(best, kind);
                self.seed_random_child(best);
            }
            self.rolling = root;
        } else {
            self.rolling = best;
        }
        None
    }

    /// Simulates random play from the node to the end of the piece queue and
    /// returns the decayed average of the visited board scores.
    ///
    /// The node's own board contributes at full weight; each further ply is
    /// discounted by [`ROLLOUT_DECAY`]. Reaching a terminal board mid-rollout
    /// stops the simulation early.
    fn rollout(&mut self, id: NodeId) -> f32 {
        let mut board = self.tree.node(id).board.clone();
        let mut ply = self.tree.node(id).depth;
        let mut total = self.score_board(&board);
        let mut weight = 1.0;
        let mut total_weight = 1.0;
        while ply < self.pieces.len() && !board.is_terminal() {
            let mut piece = Piece::new(self.pieces[ply]);
            let action = board.random_action(&mut piece, &mut self.rng);
            board.apply_action(&mut piece, action);
            weight *= ROLLOUT_DECAY;
            total_weight += weight;
            total += self.score_board(&board) * weight;
            ply += 1;
        }
        self.rollouts += 1;
        total / total_weight
    }

    /// Gives a freshly expanded node one visited child so the next UCT pass
    /// there has a statistic to compare against.
    fn seed_random_child(&mut self, parent: NodeId) {
        let children = self.tree.children(parent);
        if children.is_empty() {
            return;
        }
        let child = children[self.rng.random_range(0..children.len())];
        let reward = self.rollout(child);
        self.tree.record_visit(child, reward);
        self.tree.backpropagate(parent, reward);
    }

    fn score_board(&self, board: &Board) -> f32 {
        if self.humanized {
            board.humanized_score(&self.weights)
        } else {
            board.score(&self.weights)
        }
    }

    fn commit(&mut self, child: NodeId) -> Result<PieceAction, NoPlacement> {
        let action = self.tree.node(child).action.ok_or(NoPlacement)?;
        self.board = self.tree.node(child).board.clone();
        self.tree.promote_root(child);
        self.rolling = self.tree.root();
        Ok(action)
    }
}
