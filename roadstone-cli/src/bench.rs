//! Bench command - decision throughput per tier
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_positions(), bench_profiles(), report_results()
//! - Level 3: bench_single_profile()
//! - Level 4: position generation utilities

use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Args;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use roadstone_core::{GameResult, GameState};
use roadstone_search::{AgentProfile, SearchEngine};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct BenchArgs {
    /// Board size
    #[arg(long, default_value = "5")]
    pub size: usize,

    /// Number of seeded midgame positions to decide on
    #[arg(long, default_value = "5")]
    pub positions: usize,

    /// Random plies played out to reach each midgame position
    #[arg(long, default_value = "10")]
    pub warmup_plies: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Results of a single profile's run
#[derive(Clone, Debug, Serialize)]
struct BenchResult {
    profile: String,
    positions: usize,
    total_ms: f64,
    avg_decision_ms: f64,
    decisions_per_second: f64,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run bench command
///
/// 1. Build seeded midgame positions
/// 2. Time every tier on the same positions
/// 3. Report all results
pub fn run(args: BenchArgs, seed: Option<u64>) -> Result<()> {
    let base_seed = seed.unwrap_or(42);
    tracing::info!(
        "Benchmark: {} positions on {}x{}, seed {}",
        args.positions,
        args.size,
        args.size,
        base_seed
    );

    let positions = build_positions(&args, base_seed);
    let results = bench_profiles(&positions, base_seed);
    report_results(&results, &args)?;

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Seeded random playouts give comparable midgame positions across runs
fn build_positions(args: &BenchArgs, base_seed: u64) -> Vec<GameState> {
    (0..args.positions)
        .map(|i| random_playout(args.size, args.warmup_plies, base_seed + i as u64))
        .collect()
}

fn bench_profiles(positions: &[GameState], base_seed: u64) -> Vec<BenchResult> {
    AgentProfile::all()
        .into_iter()
        .map(|profile| bench_single_profile(profile, positions, base_seed))
        .collect()
}

// ============================================================================
// LEVEL 3 - SINGLE PROFILE
// ============================================================================

fn bench_single_profile(
    profile: AgentProfile,
    positions: &[GameState],
    base_seed: u64,
) -> BenchResult {
    let name = profile.name.clone();
    let mut engine = SearchEngine::with_seed(profile, base_seed);
    let mut total = Duration::ZERO;
    let mut decided = 0;

    for state in positions {
        if state.result() != GameResult::Ongoing {
            continue;
        }
        let start = Instant::now();
        let mv = engine.select_move(state);
        total += start.elapsed();
        if mv.is_some() {
            decided += 1;
        }
    }

    let total_ms = total.as_secs_f64() * 1000.0;
    let avg = if decided > 0 {
        total_ms / decided as f64
    } else {
        0.0
    };

    BenchResult {
        profile: name,
        positions: decided,
        total_ms,
        avg_decision_ms: avg,
        decisions_per_second: if avg > 0.0 { 1000.0 / avg } else { 0.0 },
    }
}

// ============================================================================
// LEVEL 4 - POSITION GENERATION
// ============================================================================

fn random_playout(size: usize, plies: usize, seed: u64) -> GameState {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut state = GameState::new(size);

    for _ in 0..plies {
        if state.result() != GameResult::Ongoing {
            break;
        }
        let moves = state.legal_moves();
        if moves.is_empty() {
            break;
        }
        let mv = &moves[rng.gen_range(0..moves.len())];
        match state.apply_move(mv) {
            Ok(next) => state = next,
            Err(_) => break,
        }
    }

    state
}

// ============================================================================
// LEVEL 2 - REPORTING
// ============================================================================

fn report_results(results: &[BenchResult], args: &BenchArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    println!();
    println!("| profile    | decisions | avg ms    | per second |");
    println!("|------------|-----------|-----------|------------|");
    for r in results {
        println!(
            "| {:<10} | {:>9} | {:>9.2} | {:>10.1} |",
            r.profile, r.positions, r.avg_decision_ms, r.decisions_per_second
        );
    }

    Ok(())
}
