mod common;
mod engine;
mod errors;
mod factor;
mod model;
mod multiview;
mod range;
mod run_fit;
mod run_sim;
mod simulate;
mod variable;

use crate::run_fit::*;
use crate::run_sim::*;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fit the multi-view factor model to per-view data matrices
    Fit(FitArgs),

    /// Simulate multi-view data from known factors and loadings
    Simulate(SimulateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.commands {
        Commands::Fit(args) => {
            run_fit(args)?;
        }
        Commands::Simulate(args) => {
            run_simulate(args)?;
        }
    }

    Ok(())
}
