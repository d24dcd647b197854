use std::{collections::VecDeque, time::Instant};

use quadris_engine::{Board, Piece, PieceAction, PieceKind};

/// Exploration constant of the UCT formula.
pub(crate) const UCT_C: f32 = std::f32::consts::SQRT_2;

/// Handle into the tree's node arena.
///
/// Valid for the tree that issued it until the next [`SearchTree::promote_root`]
/// call, which compacts the arena and invalidates old handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeId(usize);

#[derive(Debug)]
pub(crate) struct SearchNode {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Board state after this node's action was applied.
    pub(crate) board: Board,
    /// Action that produced this node from its parent. `None` only for the
    /// initial root.
    pub(crate) action: Option<PieceAction>,
    /// Sum of rollout rewards recorded at this node.
    pub(crate) score: f32,
    pub(crate) visits: u32,
    /// Position in the piece queue; the piece placed below this node is
    /// `pieces[depth]`. Depths are absolute, so they stay meaningful after a
    /// root promotion.
    pub(crate) depth: usize,
}

/// Arena-backed search tree that persists across turns.
///
/// Nodes live in a flat vector and reference each other by index. When a
/// placement is committed the chosen child is promoted to root and everything
/// outside its subtree is dropped, so per-turn search starts from the
/// statistics accumulated on previous turns.
#[derive(Debug)]
pub(crate) struct SearchTree {
    nodes: Vec<SearchNode>,
    root: NodeId,
}

impl SearchTree {
    pub(crate) fn new(board: Board) -> Self {
        let root = SearchNode {
            parent: None,
            children: Vec::new(),
            board,
            action: None,
            score: 0.0,
            visits: 0,
            depth: 0,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn node(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.0]
    }

    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Creates one child per legal placement of `kind` on the node's board.
    ///
    /// Children are appended in the action generator's scan order, which the
    /// tie-breaking in [`Self::recommended_child`] depends on.
    pub(crate) fn expand(&mut self, id: NodeId, kind: PieceKind) {
        debug_assert!(self.nodes[id.0].children.is_empty());
        let board = self.nodes[id.0].board.clone();
        let depth = self.nodes[id.0].depth;
        let mut piece = Piece::new(kind);
        for action in board.actions(&mut piece) {
            let mut child_board = board.clone();
            child_board.apply_action(&mut piece, action);
            let child = NodeId(self.nodes.len());
            self.nodes.push(SearchNode {
                parent: Some(id),
                children: Vec::new(),
                board: child_board,
                action: Some(action),
                score: 0.0,
                visits: 0,
                depth: depth + 1,
            });
            self.nodes[id.0].children.push(child);
        }
    }

    /// Expands the tree breadth-first down to the end of the piece queue.
    ///
    /// Stops early when the deadline passes. Since expansion is breadth-first,
    /// reaching a node past the queue means every remaining node is too, so
    /// construction ends there.
    pub(crate) fn build(&mut self, pieces: &[PieceKind], deadline: Instant) {
        let mut queue = VecDeque::from([self.root]);
        while let Some(id) = queue.pop_front() {
            if Instant::now() >= deadline {
                break;
            }
            let Some(&kind) = pieces.get(self.nodes[id.0].depth) else {
                break;
            };
            if self.nodes[id.0].board.is_terminal() {
                continue;
            }
            self.expand(id, kind);
            queue.extend(self.nodes[id.0].children.iter().copied());
        }
    }

    /// Adds one visit with the given reward to a single node.
    pub(crate) fn record_visit(&mut self, id: NodeId, reward: f32) {
        let node = &mut self.nodes[id.0];
        node.visits += 1;
        node.score += reward;
    }

    /// Adds one visit with the given reward to every node from `from` up to
    /// and including the current root.
    pub(crate) fn backpropagate(&mut self, from: NodeId, reward: f32) {
        let mut id = from;
        loop {
            let node = &mut self.nodes[id.0];
            node.visits += 1;
            node.score += reward;
            if id == self.root {
                break;
            }
            let Some(parent) = node.parent else { break };
            id = parent;
        }
    }

    /// Child maximizing the UCT value: mean reward plus an exploration bonus
    /// of `C * sqrt(ln(parent visits) / child visits)`.
    ///
    /// Unvisited children always outrank visited ones. Ties keep the earliest
    /// child in scan order.
    pub(crate) fn best_child_uct(&self, id: NodeId) -> Option<NodeId> {
        let node = &self.nodes[id.0];
        #[expect(clippy::cast_precision_loss)]
        let ln_parent = (node.visits.max(1) as f32).ln();
        let mut best = None;
        let mut best_value = f32::NEG_INFINITY;
        for &child in &node.children {
            let c = &self.nodes[child.0];
            #[expect(clippy::cast_precision_loss)]
            let value = if c.visits == 0 {
                f32::INFINITY
            } else {
                let n = c.visits as f32;
                c.score / n + UCT_C * (ln_parent / n).sqrt()
            };
            if value > best_value {
                best_value = value;
                best = Some(child);
            }
        }
        best
    }

    /// Child with the highest mean reward, used for the final recommendation.
    ///
    /// Children whose board is terminal rank below everything else, and
    /// unvisited children count as mean zero. Ties keep the earliest child in
    /// scan order.
    pub(crate) fn recommended_child(&self, id: NodeId) -> Option<NodeId> {
        let mut best = None;
        let mut best_value = f32::NEG_INFINITY;
        for &child in &self.nodes[id.0].children {
            let c = &self.nodes[child.0];
            #[expect(clippy::cast_precision_loss)]
            let value = if c.board.is_terminal() {
                f32::MIN
            } else if c.visits == 0 {
                0.0
            } else {
                c.score / c.visits as f32
            };
            if value > best_value {
                best_value = value;
                best = Some(child);
            }
        }
        best
    }

    /// Makes `new_root` the root and drops every node outside its subtree.
    ///
    /// The arena is compacted, so previously issued [`NodeId`]s are invalid
    /// afterwards.
    pub(crate) fn promote_root(&mut self, new_root: NodeId) {
        let mut remap = vec![usize::MAX; self.nodes.len()];
        let mut order = vec![new_root];
        remap[new_root.0] = 0;
        let mut i = 0;
        while i < order.len() {
            let id = order[i];
            i += 1;
            for &child in &self.nodes[id.0].children {
                remap[child.0] = order.len();
                order.push(child);
            }
        }
        let mut nodes = Vec::with_capacity(order.len());
        for &id in &order {
            let old = &self.nodes[id.0];
            nodes.push(SearchNode {
                parent: old
                    .parent
                    .map(|p| remap[p.0])
                    .filter(|&p| p != usize::MAX)
                    .map(NodeId),
                children: old.children.iter().map(|c| NodeId(remap[c.0])).collect(),
                board: old.board.clone(),
                action: old.action,
                score: old.score,
                visits: old.visits,
                depth: old.depth,
            });
        }
        self.nodes = nodes;
        self.root = NodeId(0);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(10)
    }

    #[test]
    fn test_expand_creates_one_child_per_action() {
        let mut tree = SearchTree::new(Board::new());
        let root = tree.root();
        tree.expand(root, PieceKind::O);
        assert_eq!(tree.children(root).len(), 9);
        for &child in tree.children(root) {
            let node = tree.node(child);
            assert_eq!(node.parent, Some(root));
            assert_eq!(node.depth, 1);
            assert!(node.action.is_some());
            assert_eq!(node.visits, 0);
        }
    }

    #[test]
    fn test_build_stops_at_queue_end() {
        let mut tree = SearchTree::new(Board::new());
        tree.build(&[PieceKind::O, PieceKind::O], far_deadline());
        // Root, 9 children, 9 grandchildren per child.
        assert_eq!(tree.len(), 1 + 9 + 9 * 9);
        for &child in tree.children(tree.root()) {
            for &grandchild in tree.children(child) {
                assert!(tree.children(grandchild).is_empty());
                assert_eq!(tree.node(grandchild).depth, 2);
            }
        }
    }

    #[test]
    fn test_uct_prefers_unvisited_children() {
        let mut tree = SearchTree::new(Board::new());
        let root = tree.root();
        tree.expand(root, PieceKind::O);
        let children: Vec<_> = tree.children(root).to_vec();
        for &child in &children[..children.len() - 1] {
            tree.record_visit(child, 10.0);
            tree.record_visit(root, 10.0);
        }
        let unvisited = children[children.len() - 1];
        assert_eq!(tree.best_child_uct(root), Some(unvisited));
    }

    #[test]
    fn test_uct_balances_mean_and_exploration() {
        let mut tree = SearchTree::new(Board::new());
        let root = tree.root();
        tree.expand(root, PieceKind::O);
        let children: Vec<_> = tree.children(root).to_vec();
        for &child in &children {
            tree.record_visit(child, 0.0);
            tree.record_visit(root, 0.0);
        }
        // Equal visit counts, so the highest mean wins.
        tree.record_visit(children[3], 5.0);
        tree.record_visit(root, 5.0);
        for &child in &children {
            if child != children[3] {
                tree.record_visit(child, 0.0);
                tree.record_visit(root, 0.0);
            }
        }
        assert_eq!(tree.best_child_uct(root), Some(children[3]));
    }

    #[test]
    fn test_backpropagate_updates_up_to_root_inclusive() {
        let mut tree = SearchTree::new(Board::new());
        tree.build(&[PieceKind::O, PieceKind::O], far_deadline());
        let root = tree.root();
        let child = tree.children(root)[2];
        let grandchild = tree.children(child)[4];

        tree.record_visit(grandchild, 0.5);
        tree.backpropagate(child, 0.5);

        assert_eq!(tree.node(grandchild).visits, 1);
        assert_eq!(tree.node(child).visits, 1);
        assert_eq!(tree.node(root).visits, 1);
        assert!((tree.node(root).score - 0.5).abs() < f32::EPSILON);
        // Siblings are untouched.
        assert_eq!(tree.node(tree.children(root)[0]).visits, 0);
    }

    #[test]
    fn test_recommended_child_ranks_terminal_worst() {
        // Column 0 is 19 high, so the leftmost square placement locks into
        // the region that ends the game.
        let art: String = (0..19).map(|_| "#.........\n").collect();
        let mut tree = SearchTree::new(Board::from_ascii(&art));
        let root = tree.root();
        tree.expand(root, PieceKind::O);
        let children: Vec<_> = tree.children(root).to_vec();
        let terminal = children[0];
        assert!(tree.node(terminal).board.is_terminal());

        // Even with a huge recorded mean, the terminal child loses to an
        // unvisited sibling.
        tree.record_visit(terminal, 1000.0);
        let recommended = tree.recommended_child(root).unwrap();
        assert_ne!(recommended, terminal);
        assert!(!tree.node(recommended).board.is_terminal());
    }

    #[test]
    fn test_recommended_child_breaks_ties_by_scan_order() {
        let mut tree = SearchTree::new(Board::new());
        let root = tree.root();
        tree.expand(root, PieceKind::O);
        // All children unvisited, all means zero.
        let first = tree.children(root)[0];
        assert_eq!(tree.recommended_child(root), Some(first));
    }

    #[test]
    fn test_promote_root_keeps_subtree_and_statistics() {
        let mut tree = SearchTree::new(Board::new());
        tree.build(&[PieceKind::O, PieceKind::O], far_deadline());
        let child = tree.children(tree.root())[5];
        let expected_board = tree.node(child).board.clone();
        tree.record_visit(child, 2.0);

        tree.promote_root(child);

        let root = tree.root();
        assert_eq!(tree.len(), 1 + 9);
        assert_eq!(tree.node(root).parent, None);
        assert_eq!(tree.node(root).depth, 1);
        assert_eq!(tree.node(root).visits, 1);
        assert_eq!(tree.node(root).board, expected_board);
        for &grandchild in tree.children(root) {
            assert_eq!(tree.node(grandchild).parent, Some(root));
            assert_eq!(tree.node(grandchild).depth, 2);
        }
    }
}
