//! ROADSTONE Search - The decision engine
//!
//! This crate picks moves for the machine player:
//! - Staged decisive checks (win, block, fork, anti-fork)
//! - Negamax with alpha-beta pruning and move ordering
//! - Per-decision transposition table with bound semantics
//! - Iterative deepening under a wall-clock budget
//! - Strength tiers expressed as data (`AgentProfile`)

pub mod engine;
pub mod profile;
pub mod table;

pub use engine::SearchEngine;
pub use profile::AgentProfile;
pub use table::{Bound, TranspositionTable};

use roadstone_core::{GameState, Move};

/// One-shot decision entry point: build an engine for `profile` and ask it
/// for a move. Returns `None` only when the position has no legal move.
/// Long-lived callers should keep a [`SearchEngine`] instead so the seeded
/// tie-break noise evolves across the game.
pub fn select_move(state: &GameState, profile: &AgentProfile) -> Option<Move> {
    SearchEngine::new(profile.clone()).select_move(state)
}
