//! Selfplay command - play games between two strength tiers
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_profiles(), play_match(), report_results()
//! - Level 3: play_single_game(), compute_statistics()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use roadstone_core::{Color, GameResult, GameState, Move, Weights};
use roadstone_search::{AgentProfile, SearchEngine};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct SelfplayArgs {
    /// First profile name (beginner/easy/medium/hard/master)
    #[arg(long)]
    pub a: String,

    /// Second profile name
    #[arg(long)]
    pub b: String,

    /// Number of games to play (colors alternate)
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Board size
    #[arg(long, default_value = "5")]
    pub size: usize,

    /// Maximum plies per game
    #[arg(long, default_value = "120")]
    pub max_plies: u32,

    /// Evaluation weights JSON file (defaults apply when omitted)
    #[arg(long, value_name = "FILE")]
    pub weights: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single game
#[derive(Clone, Debug, Serialize)]
struct GameRecord {
    game_number: usize,
    white_profile: String,
    black_profile: String,
    result: GameResult,
    plies: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    moves: Vec<Move>,
}

/// Aggregated match results
#[derive(Clone, Debug, Serialize)]
struct MatchResults {
    games: Vec<GameRecord>,
    a_wins: usize,
    b_wins: usize,
    draws: usize,
    avg_plies: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run selfplay command
///
/// 1. Resolve both profiles
/// 2. Play the match (multiple games, alternating colors)
/// 3. Report results
pub fn run(args: SelfplayArgs, seed: Option<u64>) -> Result<()> {
    let (profile_a, profile_b) = load_profiles(&args)?;
    let weights = load_weights(&args)?;

    tracing::info!(
        "Starting match: {} vs {} ({} games, {}x{})",
        profile_a.name,
        profile_b.name,
        args.games,
        args.size,
        args.size
    );

    let results = play_match(&profile_a, &profile_b, &weights, &args, seed);

    report_results(&profile_a, &profile_b, &results, &args)?;

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn load_profiles(args: &SelfplayArgs) -> Result<(AgentProfile, AgentProfile)> {
    let a = AgentProfile::by_name(&args.a)
        .with_context(|| format!("Unknown profile: {}", args.a))?;
    let b = AgentProfile::by_name(&args.b)
        .with_context(|| format!("Unknown profile: {}", args.b))?;
    Ok((a, b))
}

fn load_weights(args: &SelfplayArgs) -> Result<Weights> {
    match &args.weights {
        None => Ok(Weights::default()),
        Some(path) => Weights::load(path)
            .with_context(|| format!("Failed to load weights: {}", path.display())),
    }
}

fn play_match(
    profile_a: &AgentProfile,
    profile_b: &AgentProfile,
    weights: &Weights,
    args: &SelfplayArgs,
    seed: Option<u64>,
) -> MatchResults {
    let base_seed = seed.unwrap_or(42);
    let mut games = Vec::new();

    for game_number in 0..args.games {
        // Alternate colors so neither profile always moves first
        let (white, black) = if game_number % 2 == 0 {
            (profile_a, profile_b)
        } else {
            (profile_b, profile_a)
        };

        let record = play_single_game(
            white,
            black,
            weights,
            game_number,
            args,
            base_seed + game_number as u64,
        );

        tracing::info!(
            "Game {}: {:?} in {} plies ({} white, {} black)",
            game_number + 1,
            record.result,
            record.plies,
            record.white_profile,
            record.black_profile
        );

        games.push(record);
    }

    compute_statistics(profile_a, games)
}

// ============================================================================
// LEVEL 3 - GAME PLAY & STATISTICS
// ============================================================================

fn play_single_game(
    white: &AgentProfile,
    black: &AgentProfile,
    weights: &Weights,
    game_number: usize,
    args: &SelfplayArgs,
    seed: u64,
) -> GameRecord {
    let mut white_engine = SearchEngine::with_weights(white.clone(), weights.clone(), seed);
    let mut black_engine =
        SearchEngine::with_weights(black.clone(), weights.clone(), seed.wrapping_add(1));

    let mut state = GameState::new(args.size);
    let mut moves = Vec::new();

    while state.result() == GameResult::Ongoing && (moves.len() as u32) < args.max_plies {
        let engine = match state.current_player() {
            Color::White => &mut white_engine,
            Color::Black => &mut black_engine,
        };
        match engine.select_move(&state) {
            Some(mv) => match state.apply_move(&mv) {
                Ok(next) => {
                    moves.push(mv);
                    state = next;
                }
                Err(_) => break,
            },
            None => break,
        }
    }

    GameRecord {
        game_number,
        white_profile: white.name.clone(),
        black_profile: black.name.clone(),
        result: state.result(),
        plies: moves.len(),
        moves,
    }
}

fn compute_statistics(profile_a: &AgentProfile, games: Vec<GameRecord>) -> MatchResults {
    let mut a_wins = 0;
    let mut b_wins = 0;
    let mut draws = 0;
    let mut total_plies = 0;

    for record in &games {
        total_plies += record.plies;
        match record.result.winner() {
            Some(Color::White) if record.white_profile == profile_a.name => a_wins += 1,
            Some(Color::Black) if record.black_profile == profile_a.name => a_wins += 1,
            Some(_) => b_wins += 1,
            None => draws += 1,
        }
    }

    let avg_plies = if games.is_empty() {
        0.0
    } else {
        total_plies as f32 / games.len() as f32
    };

    MatchResults {
        games,
        a_wins,
        b_wins,
        draws,
        avg_plies,
    }
}

// ============================================================================
// LEVEL 2 - REPORTING
// ============================================================================

fn report_results(
    profile_a: &AgentProfile,
    profile_b: &AgentProfile,
    results: &MatchResults,
    args: &SelfplayArgs,
) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    println!();
    println!("=== MATCH RESULTS ===");
    println!("{:<12} {:>5}", profile_a.name, results.a_wins);
    println!("{:<12} {:>5}", profile_b.name, results.b_wins);
    println!("{:<12} {:>5}", "draws", results.draws);
    println!("avg plies    {:>5.1}", results.avg_plies);

    for record in &results.games {
        println!(
            "  game {:>2}: {:?} ({} plies, {} vs {})",
            record.game_number + 1,
            record.result,
            record.plies,
            record.white_profile,
            record.black_profile
        );
    }

    Ok(())
}
