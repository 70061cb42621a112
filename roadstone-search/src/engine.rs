//! Staged decision pipeline and negamax tree search

use crate::profile::AgentProfile;
use crate::table::{Bound, TranspositionTable};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use roadstone_core::analysis::{self, ThreatCache};
use roadstone_core::{
    evaluate, evaluate_with_depth, Color, GameResult, GameState, Move, Piece, Weights, WIN_VALUE,
};
use std::time::{Duration, Instant};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Fork logic distinguishes 0 / 1 / "two or more" threats
const THREAT_PAIR: usize = 2;

/// Ordering bonus for a move that removes the opponent's road threat
const BLOCK_BONUS: f32 = 500.0;

/// Early-game ordering bias toward placements for the shallow tiers
const PLACEMENT_BIAS: f32 = 2.0;

/// Shallow moves within this margin of the best count as "top-scoring"
/// for the no-search tiers. Small enough that any decisive difference
/// (a win, a block) always separates the pool.
const SHALLOW_TIE_MARGIN: f32 = 1.5;

// ============================================================================
// SEARCH ENGINE
// ============================================================================

/// The machine player. One implementation for every strength tier; the
/// profile decides which stages run and how deep the tree search goes.
pub struct SearchEngine {
    profile: AgentProfile,
    weights: Weights,
    rng: ChaCha8Rng,
    table: TranspositionTable,
    cache: ThreatCache,
}

impl SearchEngine {
    pub fn new(profile: AgentProfile) -> Self {
        Self::with_seed(profile, 42)
    }

    pub fn with_seed(profile: AgentProfile, seed: u64) -> Self {
        Self::with_weights(profile, Weights::default(), seed)
    }

    pub fn with_weights(profile: AgentProfile, weights: Weights, seed: u64) -> Self {
        Self {
            profile,
            weights,
            rng: ChaCha8Rng::seed_from_u64(seed),
            table: TranspositionTable::new(),
            cache: ThreatCache::new(),
        }
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Pick a move for the side to play. `None` only when the position has
    /// no legal continuation.
    pub fn select_move(&mut self, state: &GameState) -> Option<Move> {
        let moves = state.legal_moves();
        if moves.is_empty() {
            return None;
        }
        if moves.len() == 1 {
            return Some(moves[0].clone());
        }

        // Both memos are scoped to one decision
        self.table.clear();
        self.cache.clear();

        if self.profile.decisive_checks {
            if let Some(mv) = self.find_decisive(state, &moves) {
                return Some(mv);
            }
        }

        if !self.profile.tree_search {
            return self.pick_shallow(state, moves);
        }

        self.deepening_search(state, moves)
    }

    /// Evaluate a position (CLI and diagnostics)
    pub fn evaluate_position(&mut self, state: &GameState, perspective: Color) -> f32 {
        evaluate(state, perspective, &self.weights, &mut self.cache)
    }

    /// Play a complete game against itself
    pub fn play_game(&mut self, initial: GameState, max_plies: u32) -> (GameState, Vec<Move>) {
        let mut state = initial;
        let mut history = Vec::new();

        while state.result() == GameResult::Ongoing && (history.len() as u32) < max_plies {
            match self.select_move(&state) {
                Some(mv) => match state.apply_move(&mv) {
                    Ok(next) => {
                        history.push(mv);
                        state = next;
                    }
                    Err(_) => break,
                },
                None => break,
            }
        }

        (state, history)
    }

    // ========================================================================
    // DECISIVE STAGES
    // ========================================================================

    /// Win, block, fork, anti-fork; the first stage that finds a qualifying
    /// move short-circuits the rest.
    fn find_decisive(&mut self, state: &GameState, moves: &[Move]) -> Option<Move> {
        let me = state.current_player();
        let opp = me.opponent();

        // A move that ends the game in our favor beats everything
        for mv in moves {
            if let Ok(child) = state.apply_move(mv) {
                if child.result().winner() == Some(me) {
                    tracing::debug!(%mv, "immediate win");
                    return Some(mv.clone());
                }
            }
        }

        // Only look for a block when the opponent actually threatens a road
        if analysis::count_threats(state.board(), opp, 1) > 0 {
            for mv in moves {
                if let Ok(child) = state.apply_move(mv) {
                    if child.result().winner() == Some(opp) {
                        continue;
                    }
                    if analysis::count_threats(child.board(), opp, 1) == 0 {
                        tracing::debug!(%mv, "blocks opponent road");
                        return Some(mv.clone());
                    }
                }
            }
        }

        // A fork leaves two completion squares; one block cannot stop both
        for mv in moves {
            if let Ok(child) = state.apply_move(mv) {
                if child.result().is_terminal() {
                    continue;
                }
                if analysis::count_threats(child.board(), opp, 1) > 0 {
                    continue;
                }
                if self.cache.count_threats(&child, me, THREAT_PAIR) >= THREAT_PAIR {
                    tracing::debug!(%mv, "creates a fork");
                    return Some(mv.clone());
                }
            }
        }

        // Deny the opponent a forking square. Fork detection per candidate
        // is expensive, so only the best-ordered moves are tried; this is
        // the same branching cap the tree search applies.
        if opponent_can_fork(state, opp) {
            let limit = self.profile.candidate_cap.max(8) * 2;
            let ordered = self.order_moves(state, moves.to_vec(), limit);
            for mv in ordered {
                if let Ok(child) = state.apply_move(&mv) {
                    if child.result().winner() == Some(opp) {
                        continue;
                    }
                    if !opponent_can_fork(&child, opp) {
                        tracing::debug!(%mv, "defuses opponent fork");
                        return Some(mv);
                    }
                }
            }
        }

        None
    }

    // ========================================================================
    // SHALLOW SELECTION (no-search tiers)
    // ========================================================================

    /// One-ply scoring only: rank every move, then pick uniformly among the
    /// top-scoring pool. Weak tiers get variety, but a move that is clearly
    /// better (a win, a block) is never passed over.
    fn pick_shallow(&mut self, state: &GameState, moves: Vec<Move>) -> Option<Move> {
        let early = state.ply() < (2 * state.size()) as u16;
        let opp_threatened =
            analysis::count_threats(state.board(), state.current_player().opponent(), 1) > 0;

        let mut scored: Vec<(f32, Move)> = moves
            .into_iter()
            .map(|mv| {
                let mut score = self.shallow_score(state, &mv, opp_threatened);
                if early && matches!(mv, Move::Place { .. }) {
                    score += PLACEMENT_BIAS;
                }
                (score, mv)
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let top = scored.first()?.0;
        let tied = scored
            .iter()
            .take_while(|(score, _)| top - score <= SHALLOW_TIE_MARGIN)
            .count();
        let pool = tied.min(self.profile.shallow_pick.max(1));
        let pick = self.rng.gen_range(0..pool);
        tracing::debug!(pool, pick, "shallow selection");
        Some(scored.swap_remove(pick).1)
    }

    // ========================================================================
    // TREE SEARCH
    // ========================================================================

    /// Iterative deepening: re-search from min_depth upward, keeping the
    /// move from the deepest completed depth. A depth interrupted by the
    /// deadline is discarded whole, never half-kept.
    fn deepening_search(&mut self, state: &GameState, moves: Vec<Move>) -> Option<Move> {
        let candidates = self.order_moves(state, moves, self.profile.candidate_cap.max(1));
        let fallback = candidates.first().cloned();

        let deadline = match self.profile.time_budget_ms {
            0 => None,
            ms => Some(Instant::now() + Duration::from_millis(ms)),
        };

        let min_depth = self.profile.min_depth.max(1);
        let max_depth = self.profile.max_depth.max(min_depth);
        let mut best = None;

        for depth in min_depth..=max_depth {
            match self.search_root(state, &candidates, depth as i32, deadline) {
                Some((mv, score)) => {
                    tracing::debug!(depth, score, %mv, "depth completed");
                    let decided = score >= WIN_VALUE;
                    best = Some(mv);
                    if decided {
                        break;
                    }
                }
                None => {
                    tracing::debug!(depth, "budget expired, keeping previous depth");
                    break;
                }
            }
        }

        // Budget gone before min_depth ever finished: the ordered top move
        // is still a legal, sensible answer
        best.or(fallback)
    }

    fn search_root(
        &mut self,
        state: &GameState,
        candidates: &[Move],
        depth: i32,
        deadline: Option<Instant>,
    ) -> Option<(Move, f32)> {
        let mut alpha = f32::NEG_INFINITY;
        let beta = f32::INFINITY;
        let mut best: Option<(Move, f32)> = None;

        for mv in candidates {
            let child = match state.apply_move(mv) {
                Ok(c) => c,
                Err(_) => continue,
            };
            let score = -self.negamax(&child, depth - 1, -beta, -alpha, deadline)?;
            if best.as_ref().map(|(_, s)| score > *s).unwrap_or(true) {
                best = Some((mv.clone(), score));
            }
            alpha = alpha.max(score);
        }

        best
    }

    /// Negamax with alpha-beta. Scores are always from the perspective of
    /// the side to move in `state`; `None` means the deadline fired and the
    /// whole depth must be thrown away.
    fn negamax(
        &mut self,
        state: &GameState,
        depth: i32,
        mut alpha: f32,
        beta: f32,
        deadline: Option<Instant>,
    ) -> Option<f32> {
        if let Some(limit) = deadline {
            if Instant::now() >= limit {
                return None;
            }
        }

        let perspective = state.current_player();

        if state.result().is_terminal() {
            return Some(evaluate_with_depth(
                state,
                perspective,
                &self.weights,
                &mut self.cache,
                depth,
            ));
        }

        if depth <= 0 {
            let base = evaluate(state, perspective, &self.weights, &mut self.cache);
            let noise = (self.rng.gen::<f32>() - 0.5) * self.profile.noise_scale;
            return Some(base + noise);
        }

        let key = state.fingerprint();
        if let Some(score) = self.table.probe(key, depth as u32, alpha, beta) {
            return Some(score);
        }

        let moves = state.legal_moves();
        if moves.is_empty() {
            return Some(evaluate(state, perspective, &self.weights, &mut self.cache));
        }
        let candidates = self.order_moves(state, moves, self.profile.candidate_cap.max(1));

        let alpha_start = alpha;
        let mut best = f32::NEG_INFINITY;
        for mv in &candidates {
            let child = match state.apply_move(mv) {
                Ok(c) => c,
                // An inapplicable candidate is skipped, never an error
                Err(_) => continue,
            };
            let score = -self.negamax(&child, depth - 1, -beta, -alpha, deadline)?;
            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        let bound = if best <= alpha_start {
            Bound::Upper
        } else if best >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.table.store(key, depth as u32, best, bound);

        Some(best)
    }

    // ========================================================================
    // MOVE ORDERING
    // ========================================================================

    /// Sort moves by one-ply score, best first, and keep at most `cap`.
    /// The cap deliberately trades completeness for speed; a strong move
    /// outside the candidate set is simply never searched.
    fn order_moves(&mut self, state: &GameState, moves: Vec<Move>, cap: usize) -> Vec<Move> {
        let opp_threatened =
            analysis::count_threats(state.board(), state.current_player().opponent(), 1) > 0;

        let mut scored: Vec<(f32, Move)> = moves
            .into_iter()
            .map(|mv| {
                let score = self.shallow_score(state, &mv, opp_threatened);
                (score, mv)
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(cap);
        scored.into_iter().map(|(_, mv)| mv).collect()
    }

    /// Evaluation after applying the move, from the mover's point of view,
    /// with a bonus for neutralizing an opponent road threat. Terminal
    /// children already carry the win value, so wins sort first for free.
    fn shallow_score(&mut self, state: &GameState, mv: &Move, opp_threatened: bool) -> f32 {
        let me = state.current_player();
        match state.apply_move(mv) {
            Err(_) => f32::NEG_INFINITY,
            Ok(child) => {
                let mut score = evaluate(&child, me, &self.weights, &mut self.cache);
                if opp_threatened
                    && analysis::count_threats(child.board(), me.opponent(), 1) == 0
                {
                    score += BLOCK_BONUS;
                }
                score
            }
        }
    }
}

/// Can `opp` place a flat somewhere and end up with two or more road
/// threats? The anti-fork stage runs this on the current position and on
/// each candidate child.
fn opponent_can_fork(state: &GameState, opp: Color) -> bool {
    let board = state.board();
    for sq in board.squares() {
        if !board.can_place_on(sq) {
            continue;
        }
        let probe = board.place_piece(sq, Piece::flat(opp));
        if analysis::count_threats(&probe, opp, THREAT_PAIR) >= THREAT_PAIR {
            return true;
        }
    }
    false
}

// ============================================================================
// TESTS
// ============================================================================
