//! Evolutionary tuning of the heuristic weights.
//!
//! The tuner evolves genomes (flat gene vectors in `[0, 1]`) that map onto
//! the engine's weight struct. Fitness is the score of one greedy game per
//! individual; breeding uses fitness-proportionate selection, uniform
//! crossover, and a small per-gene mutation, with the whole population
//! replaced every generation.
//!
//! - [`genetic`] - the [`genetic::Tuner`] driving evaluate/breed cycles and
//!   the [`genetic::GenerationStore`] sink for per-generation summaries
//! - [`genome`] - gene vector operators shared by the tuner

pub mod genetic;
pub mod genome;
