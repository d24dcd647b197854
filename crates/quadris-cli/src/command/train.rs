use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Utc;
use quadris_training::genetic::{GenerationStore as _, Tuner, TunerConfig};
use rand::SeedableRng as _;
use rand_pcg::Pcg32;

use crate::{
    model::WeightModel,
    util::{JsonlStore, Output},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Individuals per generation
    #[arg(long, default_value_t = 30)]
    population_size: usize,
    /// Generations to run
    #[arg(long, default_value_t = 100)]
    generations: u32,
    /// Per-gene mutation probability
    #[arg(long, default_value_t = 0.1)]
    mutation_rate: f32,
    /// Evolve the extra humanized gene and score with the humanized
    /// evaluation
    #[arg(long)]
    humanized: bool,
    /// Pieces per evaluation game
    #[arg(long, default_value_t = 500)]
    turn_limit: usize,
    /// RNG seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Append per-generation summaries to this file as JSON lines
    #[arg(long)]
    log: Option<PathBuf>,
    /// Output file path for the trained model (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let config = TunerConfig {
        population_size: arg.population_size,
        mutation_rate: arg.mutation_rate,
        humanized: arg.humanized,
        turn_limit: arg.turn_limit,
    };
    let rng = match arg.seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_os_rng(),
    };
    let mut tuner = Tuner::new(config, rng);
    let mut log = arg.log.as_ref().map(JsonlStore::create).transpose()?;

    for _ in 0..arg.generations {
        let summary = tuner.step();
        eprintln!("Generation #{}:", summary.generation);
        eprintln!(
            "  Best: {} ({} pieces, {} lines, level {})",
            summary.best_score, summary.pieces, summary.lines, summary.level,
        );
        eprintln!("  Mean: {:.1}", summary.mean_score);
        eprintln!("  Weights: {:?}", summary.best_weights);
        if let Some(log) = &mut log {
            log.record(&summary)
                .context("Failed to append generation log entry")?;
        }
    }

    let best = tuner.best().context("No generations were run")?;
    eprintln!();
    eprintln!(
        "Training completed; best generation #{} scored {}",
        best.generation, best.best_score,
    );

    let model = WeightModel {
        name: if arg.humanized { "humanized" } else { "standard" }.to_owned(),
        trained_at: Utc::now(),
        best_score: best.best_score,
        weights: best.best_weights.clone(),
    };
    Output::save_json(&model, arg.output.clone())?;

    eprintln!();
    eprintln!("Model saved successfully");
    if let Some(path) = &arg.output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Name: {}", model.name);
    eprintln!("  Trained at: {}", model.trained_at);
    eprintln!("  Best score: {}", model.best_score);

    Ok(())
}
