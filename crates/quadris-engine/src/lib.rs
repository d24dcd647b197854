//! Board and piece model for a falling-block puzzle bot.
//!
//! This crate provides the simulation core that the search and training
//! layers are built on:
//!
//! - [`Board`] - bitmask board state with lock/clear logic and the heuristic
//!   queries (holes, bumpiness, rows with holes) used to score positions
//! - [`Piece`] / [`PieceKind`] - tetromino model with in-place rotation and
//!   collision-checked movement
//! - [`PieceAction`] - a final placement (rotation index + target column),
//!   enumerated by [`Board::actions`] and resolved by [`Board::apply_action`]
//! - [`Weights`] - heuristic weight vector, settable at any time
//! - [`GameStats`] - score, piece, and line counters shared by the tuner and
//!   the session runner
//!
//! Rendering, input handling, and the piece supply are external concerns;
//! callers feed piece kinds in and apply the resulting actions themselves.

pub use self::{action::*, board::*, piece::*, stats::*};

pub(crate) mod action;
pub(crate) mod board;
pub(crate) mod piece;
pub(crate) mod stats;
