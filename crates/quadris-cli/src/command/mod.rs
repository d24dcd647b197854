use clap::{Parser, Subcommand};

use self::{auto_play::AutoPlayArg, train::TrainArg};

mod auto_play;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Tune heuristic weights with the evolutionary tuner
    Train(#[clap(flatten)] TrainArg),
    /// Let a bot play a session against a random piece stream
    AutoPlay(#[clap(flatten)] AutoPlayArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::AutoPlay(arg) => auto_play::run(&arg)?,
    }
    Ok(())
}
