//! Evolutionary tuner for the heuristic weights.
//!
//! Each individual is a genome that maps to a [`Weights`] vector. A
//! generation is evaluated by letting every individual play one greedy game
//! against a random piece stream, scored with the standard line-clear table.
//! The next generation is bred by fitness-proportionate selection, uniform
//! crossover, and per-gene mutation, replacing the whole population.
//!
//! Games run sequentially so a tuning run is reproducible from its seed.

use quadris_engine::{GameStats, PieceKind, Weights};
use quadris_search::GreedyBot;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::genome;

/// Genes per genome without the humanized gene.
const BASE_GENES: usize = 4;

#[derive(Debug, Clone)]
struct Individual {
    genes: Vec<f32>,
    result: GameStats,
}

/// Parameters of a tuning run.
#[derive(Debug, Clone)]
pub struct TunerConfig {
    /// Individuals per generation.
    pub population_size: usize,
    /// Per-gene mutation probability.
    pub mutation_rate: f32,
    /// Evolve the extra humanized gene and score games with the humanized
    /// evaluation.
    pub humanized: bool,
    /// Pieces per evaluation game; games also end early on a terminal board.
    pub turn_limit: usize,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            population_size: 30,
            mutation_rate: 0.1,
            humanized: false,
            turn_limit: 500,
        }
    }
}

/// Snapshot of one evaluated generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// 1-based generation index.
    pub generation: u32,
    /// Weights of the best individual.
    pub best_weights: Weights,
    pub best_score: usize,
    pub mean_score: f64,
    /// Pieces placed by the best individual's game.
    pub pieces: usize,
    /// Lines cleared by the best individual's game.
    pub lines: usize,
    /// Level reached by the best individual's game.
    pub level: usize,
}

/// Sink for per-generation summaries.
pub trait GenerationStore {
    type Error: std::error::Error + Send + Sync + 'static;

    fn record(&mut self, summary: &GenerationSummary) -> Result<(), Self::Error>;
}

/// Store that keeps summaries in memory, mainly for inspection and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    summaries: Vec<GenerationSummary>,
}

impl MemoryStore {
    #[must_use]
    pub fn summaries(&self) -> &[GenerationSummary] {
        &self.summaries
    }
}

impl GenerationStore for MemoryStore {
    type Error = std::convert::Infallible;

    fn record(&mut self, summary: &GenerationSummary) -> Result<(), Self::Error> {
        self.summaries.push(summary.clone());
        Ok(())
    }
}

/// Evolutionary weight tuner.
///
/// [`Self::step`] evaluates the current generation, returns its summary, and
/// breeds the next one. The best summary seen so far is retained across
/// steps.
#[derive(Debug)]
pub struct Tuner<R> {
    config: TunerConfig,
    generation: u32,
    individuals: Vec<Individual>,
    best: Option<GenerationSummary>,
    rng: R,
}

impl<R> Tuner<R>
where
    R: Rng,
{
    pub fn new(config: TunerConfig, mut rng: R) -> Self {
        let gene_count = BASE_GENES + usize::from(config.humanized);
        let individuals = (0..config.population_size)
            .map(|_| Individual {
                genes: genome::random(&mut rng, gene_count),
                result: GameStats::new(),
            })
            .collect();
        Self {
            config,
            generation: 1,
            individuals,
            best: None,
            rng,
        }
    }

    /// Index of the generation the next [`Self::step`] call will evaluate.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Best generation summary seen so far.
    #[must_use]
    pub fn best(&self) -> Option<&GenerationSummary> {
        self.best.as_ref()
    }

    /// Evaluates the current generation and breeds the next one.
    ///
    /// Every individual plays one game, sequentially, on the tuner's RNG.
    /// The returned summary describes the generation that was just
    /// evaluated; afterwards the population is fully replaced.
    pub fn step(&mut self) -> GenerationSummary {
        for individual in &mut self.individuals {
            individual.result = play_game(
                &individual.genes,
                self.config.humanized,
                self.config.turn_limit,
                &mut self.rng,
            );
        }
        let summary = self.summarize();
        if self.best.as_ref().is_none_or(|b| summary.best_score > b.best_score) {
            self.best = Some(summary.clone());
        }
        self.breed();
        self.generation += 1;
        summary
    }

    fn summarize(&self) -> GenerationSummary {
        let best = self
            .individuals
            .iter()
            .max_by_key(|individual| individual.result.score)
            .unwrap();
        let total: usize = self.individuals.iter().map(|i| i.result.score).sum();
        #[expect(clippy::cast_precision_loss)]
        let mean_score = total as f64 / self.individuals.len() as f64;
        GenerationSummary {
            generation: self.generation,
            best_weights: Weights::from_genes(&best.genes),
            best_score: best.result.score,
            mean_score,
            pieces: best.result.pieces,
            lines: best.result.lines,
            level: best.result.level(),
        }
    }

    /// Replaces the whole population with offspring of the evaluated one.
    fn breed(&mut self) {
        let mut next = Vec::with_capacity(self.individuals.len());
        for _ in 0..self.individuals.len() {
            let p1 = select(&self.individuals, &mut self.rng);
            let p2 = select(&self.individuals, &mut self.rng);
            let mut genes = genome::crossover(&p1.genes, &p2.genes, &mut self.rng);
            genome::mutate(&mut genes, self.config.mutation_rate, &mut self.rng);
            next.push(Individual {
                genes,
                result: GameStats::new(),
            });
        }
        self.individuals = next;
    }
}

/// Fitness-proportionate (roulette) selection.
///
/// Falls back to a uniform pick when every score is zero, which is common in
/// the first generations.
fn select<'a, R>(individuals: &'a [Individual], rng: &mut R) -> &'a Individual
where
    R: Rng + ?Sized,
{
    let total: usize = individuals.iter().map(|i| i.result.score).sum();
    if total == 0 {
        return &individuals[rng.random_range(0..individuals.len())];
    }
    let mut ticket = rng.random_range(0..total);
    for individual in individuals {
        if ticket < individual.result.score {
            return individual;
        }
        ticket -= individual.result.score;
    }
    // Unreachable: the tickets sum to `total`.
    &individuals[individuals.len() - 1]
}

/// Plays one greedy game with the genome's weights against a random piece
/// stream and returns the scored outcome.
fn play_game<R>(genes: &[f32], humanized: bool, turn_limit: usize, rng: &mut R) -> GameStats
where
    R: Rng + ?Sized,
{
    let mut bot = GreedyBot::new(Weights::from_genes(genes), humanized);
    let mut stats = GameStats::new();
    for _ in 0..turn_limit {
        let kind: PieceKind = rng.random();
        let Ok(_) = bot.decide(kind) else { break };
        stats.record_lock(bot.board().cleared_lines());
    }
    stats
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn small_config() -> TunerConfig {
        TunerConfig {
            population_size: 4,
            mutation_rate: 0.1,
            humanized: false,
            turn_limit: 20,
        }
    }

    #[test]
    fn test_generation_counter_starts_at_one() {
        let mut tuner = Tuner::new(small_config(), Pcg32::seed_from_u64(1));
        assert_eq!(tuner.generation(), 1);
        let summary = tuner.step();
        assert_eq!(summary.generation, 1);
        assert_eq!(tuner.generation(), 2);
    }

    #[test]
    fn test_step_records_one_summary_per_generation() {
        let mut tuner = Tuner::new(small_config(), Pcg32::seed_from_u64(2));
        let mut store = MemoryStore::default();
        for _ in 0..3 {
            let summary = tuner.step();
            store.record(&summary).unwrap();
        }
        let generations: Vec<_> = store.summaries().iter().map(|s| s.generation).collect();
        assert_eq!(generations, [1, 2, 3]);
    }

    #[test]
    fn test_population_is_fully_replaced_each_step() {
        let mut tuner = Tuner::new(small_config(), Pcg32::seed_from_u64(3));
        tuner.step();
        assert_eq!(tuner.individuals.len(), 4);
        for individual in &tuner.individuals {
            assert_eq!(individual.genes.len(), 4);
            assert!(individual.genes.iter().all(|g| (0.0..=1.0).contains(g)));
            // Offspring start unevaluated.
            assert_eq!(individual.result, GameStats::new());
        }
    }

    #[test]
    fn test_humanized_config_adds_a_gene() {
        let config = TunerConfig {
            humanized: true,
            ..small_config()
        };
        let tuner = Tuner::new(config, Pcg32::seed_from_u64(4));
        assert!(tuner.individuals.iter().all(|i| i.genes.len() == 5));
        assert!(
            Weights::from_genes(&tuner.individuals[0].genes)
                .humanized
                .is_some()
        );
    }

    #[test]
    fn test_summary_reflects_best_individual() {
        let mut tuner = Tuner::new(small_config(), Pcg32::seed_from_u64(5));
        let summary = tuner.step();
        #[expect(clippy::cast_precision_loss)]
        let best = summary.best_score as f64;
        assert!(best >= summary.mean_score);
        assert!(summary.pieces > 0, "a fresh board always takes a piece");
        assert_eq!(tuner.best().unwrap().best_score, summary.best_score);
    }

    #[test]
    fn test_select_with_all_zero_scores_is_uniform_fallback() {
        let individuals: Vec<_> = (0..3)
            .map(|_| Individual {
                genes: vec![0.5; 4],
                result: GameStats::new(),
            })
            .collect();
        let mut rng = Pcg32::seed_from_u64(6);
        // Must not panic or divide by zero.
        for _ in 0..20 {
            let _ = select(&individuals, &mut rng);
        }
    }

    #[test]
    fn test_summary_serializes_round_trip() {
        let mut tuner = Tuner::new(small_config(), Pcg32::seed_from_u64(7));
        let summary = tuner.step();
        let json = serde_json::to_string(&summary).unwrap();
        let back: GenerationSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.generation, summary.generation);
        assert_eq!(back.best_score, summary.best_score);
        assert_eq!(back.best_weights, summary.best_weights);
    }
}
