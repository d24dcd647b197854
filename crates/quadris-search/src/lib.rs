//! Decision layers on top of the `quadris-engine` board model.
//!
//! Two bots share the engine's placement enumeration:
//!
//! - [`MctsBot`] - Monte Carlo tree search whose tree persists across turns;
//!   the committed placement's subtree becomes the next root, so statistics
//!   accumulate over a whole game
//! - [`GreedyBot`] - one-ply lookahead used by the weight tuner, with an
//!   optional humanized scoring mode that keeps the leftmost column open
//!
//! Both keep an internal board mirror: callers feed piece kinds in and apply
//! the returned actions to their own game state.

pub use self::{
    greedy::GreedyBot,
    mcts::{MctsBot, NoPlacement},
};

pub(crate) mod greedy;
pub(crate) mod mcts;
pub(crate) mod tree;
