//! Position evaluation

use crate::analysis::{best_chain, ThreatCache};
use crate::game::{GameResult, GameState};
use crate::pieces::Color;
use crate::board::Square;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Threats beyond this many are all the same to the evaluator
const THREAT_CAP: usize = 2;

/// Heuristic weights for position evaluation.
///
/// The contract is the ordering road win >> flat majority > threats >
/// chain > positional control; the magnitudes are tuning knobs, validated
/// empirically through self-play rather than pinned by tests.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Weights {
    /// Per capped road threat
    pub threat: f32,
    /// Per cell of the longest controlled chain
    pub chain: f32,
    /// Per distinct edge the longest chain reaches
    pub edge_reach: f32,
    /// Per top-of-stack flat (projects the endgame flat count)
    pub flat: f32,
    /// Per controlled cell, scaled by closeness to the center
    pub center: f32,
    /// Per reserve piece already placed relative to the opponent
    pub reserve: f32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            threat: 5.0,
            chain: 1.0,
            edge_reach: 2.0,
            flat: 8.0,
            center: 0.25,
            reserve: 0.5,
        }
    }
}

impl Weights {
    /// Load from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let weights: Weights = serde_json::from_str(&content)?;
        Ok(weights)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Win value (effectively infinite, dominates every heuristic sum)
pub const WIN_VALUE: f32 = 100000.0;

/// Evaluate a position from `perspective`'s point of view.
///
/// Antisymmetric by construction: each signal is computed per color and
/// differenced, so `evaluate(s, White) == -evaluate(s, Black)` exactly,
/// which negamax relies on.
pub fn evaluate(
    state: &GameState,
    perspective: Color,
    weights: &Weights,
    cache: &mut ThreatCache,
) -> f32 {
    match state.result() {
        GameResult::RoadWin(winner) | GameResult::FlatWin(winner) => {
            return if winner == perspective {
                WIN_VALUE
            } else {
                -WIN_VALUE
            };
        }
        GameResult::Draw => return 0.0,
        GameResult::Ongoing => {}
    }

    side_score(state, perspective, weights, cache)
        - side_score(state, perspective.opponent(), weights, cache)
}

/// Evaluate with a depth bonus so the search prefers faster wins
pub fn evaluate_with_depth(
    state: &GameState,
    perspective: Color,
    weights: &Weights,
    cache: &mut ThreatCache,
    depth: i32,
) -> f32 {
    match state.result() {
        GameResult::Ongoing => evaluate(state, perspective, weights, cache),
        _ => {
            let base = evaluate(state, perspective, weights, cache);
            // Higher remaining depth = closer to the root = sooner
            if base > 0.0 {
                base + depth as f32
            } else if base < 0.0 {
                base - depth as f32
            } else {
                base
            }
        }
    }
}

fn side_score(
    state: &GameState,
    color: Color,
    weights: &Weights,
    cache: &mut ThreatCache,
) -> f32 {
    let board = state.board();
    let mut score = 0.0f32;

    // Road threats, capped: forks care about 0 / 1 / many, not totals
    let threats = cache.count_threats(state, color, THREAT_CAP) as f32;
    score += weights.threat * threats;

    // Longest chain and how many edges it already touches
    let (chain_len, edges) = best_chain(board, color);
    score += weights.chain * chain_len as f32;
    score += weights.edge_reach * edges.count() as f32;

    // Projected flat count
    score += weights.flat * board.count_flat_tops(color) as f32;

    // Positional control, weighted toward the center
    if weights.center.abs() > 0.001 {
        let size = board.size();
        for sq in board.squares() {
            if board
                .stack_at(sq)
                .and_then(|s| s.controller())
                .map(|c| c == color)
                .unwrap_or(false)
            {
                score += weights.center * centrality(sq, size);
            }
        }
    }

    // Placed-piece balance: board presence over hoarded reserves
    let (stones, caps) = state.reserves(color);
    let placed = (crate::pieces::starting_stones(board.size()) - stones) as f32
        + (crate::pieces::starting_capstones(board.size()) - caps) as f32;
    score += weights.reserve * placed;

    score
}

/// 0 at the far corners, rising toward the board center
fn centrality(sq: Square, size: usize) -> f32 {
    let mid = (size as f32 - 1.0) / 2.0;
    let dist = (sq.row as f32 - mid).abs() + (sq.col as f32 - mid).abs();
    (size as f32 - 1.0) - dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::pieces::Piece;

    fn state_with_flats(cells: &[(i8, i8)], color: Color, to_move: Color) -> GameState {
        let mut board = Board::new(5);
        for &(row, col) in cells {
            board = board.place_piece(Square::new(row, col), Piece::flat(color));
        }
        GameState::from_board(board, to_move).unwrap()
    }

    #[test]
    fn test_empty_position_is_balanced() {
        let state = GameState::new(5);
        let mut cache = ThreatCache::new();
        let score = evaluate(&state, Color::White, &Weights::default(), &mut cache);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_antisymmetry() {
        let state = state_with_flats(&[(2, 0), (2, 1), (1, 3)], Color::White, Color::Black);
        let mut cache = ThreatCache::new();
        let weights = Weights::default();
        let white = evaluate(&state, Color::White, &weights, &mut cache);
        let black = evaluate(&state, Color::Black, &weights, &mut cache);
        assert!((white + black).abs() < 1e-3);
        assert!(white > 0.0, "white has all the material: {}", white);
    }

    #[test]
    fn test_win_dominates_heuristics() {
        let winning = state_with_flats(
            &[(2, 0), (2, 1), (2, 2), (2, 3), (2, 4)],
            Color::White,
            Color::Black,
        );
        let mut cache = ThreatCache::new();
        let weights = Weights::default();
        assert_eq!(
            evaluate(&winning, Color::White, &weights, &mut cache),
            WIN_VALUE
        );
        assert_eq!(
            evaluate(&winning, Color::Black, &weights, &mut cache),
            -WIN_VALUE
        );
    }

    #[test]
    fn test_depth_bonus_prefers_faster_wins() {
        let winning = state_with_flats(
            &[(2, 0), (2, 1), (2, 2), (2, 3), (2, 4)],
            Color::White,
            Color::Black,
        );
        let mut cache = ThreatCache::new();
        let weights = Weights::default();
        let near = evaluate_with_depth(&winning, Color::White, &weights, &mut cache, 5);
        let far = evaluate_with_depth(&winning, Color::White, &weights, &mut cache, 1);
        assert!(near > far);

        let near_loss = evaluate_with_depth(&winning, Color::Black, &weights, &mut cache, 5);
        let far_loss = evaluate_with_depth(&winning, Color::Black, &weights, &mut cache, 1);
        assert!(near_loss < far_loss);
    }

    #[test]
    fn test_default_weights_ordering() {
        let w = Weights::default();
        assert!(w.flat > w.threat);
        assert!(w.threat > w.chain);
        assert!(w.chain > w.center);
        assert!(WIN_VALUE > 25.0 * (w.flat + w.threat + w.chain + w.edge_reach) * 8.0);
    }

    #[test]
    fn test_centrality() {
        assert_eq!(centrality(Square::new(2, 2), 5), 4.0);
        assert_eq!(centrality(Square::new(0, 0), 5), 0.0);
        assert!(centrality(Square::new(2, 2), 5) > centrality(Square::new(2, 0), 5));
    }
}
