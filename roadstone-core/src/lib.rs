//! ROADSTONE Core - Game rules and position analysis
//!
//! This crate provides the rules layer for the road game:
//! - Board grid with copy-on-write piece stacks
//! - Piece roles, colors and per-size reserves
//! - Game state, legal move generation and move application
//! - Road/threat connectivity analysis
//! - Position evaluation with tunable weights
//! - Compact move notation for the application boundary

pub mod analysis;
pub mod board;
pub mod eval;
pub mod game;
pub mod notation;
pub mod pieces;

// Re-exports for convenient access
pub use analysis::{chain_extension, has_road, reachable_edges, EdgeSet, ThreatCache};
pub use board::{Board, Direction, Square, DIRECTIONS, MAX_BOARD_SIZE, MIN_BOARD_SIZE};
pub use eval::{evaluate, evaluate_with_depth, Weights, WIN_VALUE};
pub use game::{GameResult, GameState, Move, MoveError};
pub use notation::NotationError;
pub use pieces::{starting_capstones, starting_stones, Color, Piece, PieceStack, Role};
