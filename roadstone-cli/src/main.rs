//! ROADSTONE CLI - Command-line interface
//!
//! Commands:
//! - selfplay: play matches between two strength tiers
//! - analyze: inspect a position reached by a move sequence
//! - bench: measure decision throughput per tier

use clap::{Parser, Subcommand};

mod analyze;
mod bench;
mod selfplay;

#[derive(Parser)]
#[command(name = "roadstone")]
#[command(about = "Road-game engine: self-play, analysis and benchmarks")]
struct Cli {
    /// Seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play matches between two strength tiers
    Selfplay(selfplay::SelfplayArgs),
    /// Inspect a position reached by a move sequence
    Analyze(analyze::AnalyzeArgs),
    /// Measure decision throughput per tier
    Bench(bench::BenchArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Selfplay(args) => selfplay::run(args, cli.seed),
        Commands::Analyze(args) => analyze::run(args, cli.seed),
        Commands::Bench(args) => bench::run(args, cli.seed),
    }
}
