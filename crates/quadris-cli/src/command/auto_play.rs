use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use quadris_engine::{Board, GameStats, PieceKind, Weights};
use quadris_search::{GreedyBot, MctsBot};
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::{model::WeightModel, util::Output};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub enum BotKind {
    #[default]
    Mcts,
    Greedy,
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct AutoPlayArg {
    /// Which bot plays the session
    #[arg(long, default_value = "mcts")]
    bot: BotKind,
    /// Upcoming pieces known to the bot in advance
    #[arg(long, default_value_t = 3)]
    lookahead: usize,
    /// Pieces to play before stopping
    #[arg(long, default_value_t = 1000)]
    turns: usize,
    /// Initial tree construction budget in milliseconds
    #[arg(long, default_value_t = 1000)]
    build_budget_ms: u64,
    /// Per-turn search budget in milliseconds
    #[arg(long, default_value_t = 100)]
    turn_budget_ms: u64,
    /// Score with the humanized evaluation
    #[arg(long)]
    humanized: bool,
    /// RNG seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Weight model JSON produced by `train` (unit weights when omitted)
    #[arg(long)]
    model: Option<PathBuf>,
    /// Output file path for the session report (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

/// Final state of one automated session.
#[derive(Debug, Serialize)]
struct SessionReport {
    bot: String,
    stats: GameStats,
    level: usize,
    game_over: bool,
    /// Total rollouts simulated; absent for the greedy bot.
    #[serde(skip_serializing_if = "Option::is_none")]
    rollouts: Option<u64>,
    elapsed_ms: u128,
}

pub(crate) fn run(arg: &AutoPlayArg) -> anyhow::Result<()> {
    let weights = match &arg.model {
        Some(path) => {
            let model = WeightModel::open(path)?;
            eprintln!("Loaded model '{}' (trained at {})", model.name, model.trained_at);
            model.weights
        }
        None => Weights::default(),
    };

    let seed = arg.seed.unwrap_or_else(|| rand::rng().random());
    eprintln!("Playing {} turns with seed {seed}", arg.turns);

    let start = Instant::now();
    let report = match arg.bot {
        BotKind::Mcts => play_mcts(arg, weights, seed),
        BotKind::Greedy => play_greedy(arg, weights, seed),
    };
    let report = SessionReport {
        elapsed_ms: start.elapsed().as_millis(),
        ..report
    };

    eprintln!(
        "Session finished: {} pieces, {} lines, level {}, score {}",
        report.stats.pieces,
        report.stats.lines,
        report.level,
        report.stats.score,
    );
    Output::save_json(&report, arg.output.clone())?;
    Ok(())
}

fn play_mcts(arg: &AutoPlayArg, weights: Weights, seed: u64) -> SessionReport {
    let mut stream_rng = Pcg32::seed_from_u64(seed);
    let mut pieces: Vec<PieceKind> = (0..arg.lookahead.max(1))
        .map(|_| stream_rng.random())
        .collect();

    let mut bot = MctsBot::new(
        Board::new(),
        &pieces,
        Duration::from_millis(arg.build_budget_ms),
        Pcg32::seed_from_u64(seed.wrapping_add(1)),
    );
    bot.set_weights(weights);
    bot.set_humanized(arg.humanized);

    let turn_budget = Duration::from_millis(arg.turn_budget_ms);
    let mut stats = GameStats::new();
    let mut game_over = false;
    for turn in 0..arg.turns {
        let piece = pieces[turn];
        let Ok(action) = bot.decide(piece, turn_budget) else {
            game_over = true;
            break;
        };
        let cleared = bot.board().cleared_lines();
        stats.record_lock(cleared);
        eprintln!(
            "  #{turn:4}: {} rot {} col {} ({cleared} lines)",
            piece.as_char(),
            action.rotation,
            action.column,
        );
        let next: PieceKind = stream_rng.random();
        pieces.push(next);
        bot.notify_piece(next);
    }

    SessionReport {
        bot: "mcts".to_owned(),
        stats,
        level: stats.level(),
        game_over,
        rollouts: Some(bot.rollouts()),
        elapsed_ms: 0,
    }
}

fn play_greedy(arg: &AutoPlayArg, weights: Weights, seed: u64) -> SessionReport {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut bot = GreedyBot::new(weights, arg.humanized);
    let mut stats = GameStats::new();
    let mut game_over = false;
    for turn in 0..arg.turns {
        let kind: PieceKind = rng.random();
        let Ok(action) = bot.decide(kind) else {
            game_over = true;
            break;
        };
        let cleared = bot.board().cleared_lines();
        stats.record_lock(cleared);
        eprintln!(
            "  #{turn:4}: {} rot {} col {} ({cleared} lines)",
            kind.as_char(),
            action.rotation,
            action.column,
        );
    }

    SessionReport {
        bot: "greedy".to_owned(),
        stats,
        level: stats.level(),
        game_over,
        rollouts: None,
        elapsed_ms: 0,
    }
}
