//! Game state, legal move generation and move application

use crate::analysis;
use crate::board::{Board, Direction, Square, DIRECTIONS};
use crate::pieces::{starting_capstones, starting_stones, Color, Piece, Role};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use thiserror::Error;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Game result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Ongoing,
    /// A chain of road-counting cells connects two opposite edges
    RoadWin(Color),
    /// Board filled or a reserve ran out; decided on top-of-stack flats
    FlatWin(Color),
    Draw,
}

impl GameResult {
    pub fn is_terminal(self) -> bool {
        self != GameResult::Ongoing
    }

    pub fn winner(self) -> Option<Color> {
        match self {
            GameResult::RoadWin(c) | GameResult::FlatWin(c) => Some(c),
            _ => None,
        }
    }
}

/// A legal move: place a reserve piece, or spread an owned stack
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Place {
        square: Square,
        role: Role,
    },
    Spread {
        square: Square,
        direction: Direction,
        /// Pieces dropped on each step away from the source; sums to the
        /// number of pieces picked up
        drops: Vec<u8>,
    },
}

/// Why a move could not be applied
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("the game is already over")]
    GameOver,
    #[error("square is off the board")]
    OffBoard,
    #[error("placement target is not empty")]
    Occupied,
    #[error("no {0:?} pieces left in reserve")]
    EmptyReserve(Role),
    #[error("opening moves must place a flat stone")]
    OpeningRestriction,
    #[error("source stack is not controlled by the moving player")]
    NotYourStack,
    #[error("carry of {carried} exceeds stack height {height} or carry limit {limit}")]
    CarryLimit {
        carried: usize,
        height: usize,
        limit: usize,
    },
    #[error("drop sequence is empty or contains a zero")]
    BadDropSequence,
    #[error("spread is blocked at {0:?}")]
    Blocked(Square),
}

// ============================================================================
// GAME STATE
// ============================================================================

/// An immutable game position: board, reserves, side to move, result.
///
/// Every mutation goes through [`GameState::apply_move`], which returns a
/// fresh value; illegal input yields `Err` and leaves nothing modified.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    board: Board,
    to_move: Color,
    white_stones: u8,
    white_caps: u8,
    black_stones: u8,
    black_caps: u8,
    /// Half-moves played; the opening color-swap rule covers plies 0 and 1
    ply: u16,
    result: GameResult,
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Fresh game on an empty board
    pub fn new(size: usize) -> Self {
        let board = Board::new(size);
        let size = board.size();
        Self {
            board,
            to_move: Color::White,
            white_stones: starting_stones(size),
            white_caps: starting_capstones(size),
            black_stones: starting_stones(size),
            black_caps: starting_capstones(size),
            ply: 0,
            result: GameResult::Ongoing,
        }
    }

    /// Rebuild a position from a board (setup/testing boundary).
    ///
    /// Reserves are derived from what is on the board so the reserve-sum
    /// invariant holds by construction; the ply counter is approximated
    /// from the piece count, which is only used for the opening rule.
    pub fn from_board(board: Board, to_move: Color) -> Result<Self, MoveError> {
        let size = board.size();
        let mut state = Self {
            board,
            to_move,
            white_stones: 0,
            white_caps: 0,
            black_stones: 0,
            black_caps: 0,
            ply: 0,
            result: GameResult::Ongoing,
        };

        for &color in &[Color::White, Color::Black] {
            let (stones, caps) = state.board.count_stones_and_caps(color);
            let stone_allot = starting_stones(size) as usize;
            let cap_allot = starting_capstones(size) as usize;
            if stones > stone_allot || caps > cap_allot {
                return Err(MoveError::EmptyReserve(Role::Flat));
            }
            let (stones_left, caps_left) = (
                (stone_allot - stones) as u8,
                (cap_allot - caps) as u8,
            );
            match color {
                Color::White => {
                    state.white_stones = stones_left;
                    state.white_caps = caps_left;
                }
                Color::Black => {
                    state.black_stones = stones_left;
                    state.black_caps = caps_left;
                }
            }
        }

        let on_board =
            state.board.count_pieces(Color::White) + state.board.count_pieces(Color::Black);
        state.ply = on_board as u16;
        state.result = state.resolve_result(to_move.opponent());
        Ok(state)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn size(&self) -> usize {
        self.board.size()
    }

    pub fn current_player(&self) -> Color {
        self.to_move
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub fn ply(&self) -> u16 {
        self.ply
    }

    /// Each side's first move places for the opponent
    pub fn in_opening(&self) -> bool {
        self.ply < 2
    }

    /// (flat/standing stones, capstones) left in `color`'s reserve
    pub fn reserves(&self, color: Color) -> (u8, u8) {
        match color {
            Color::White => (self.white_stones, self.white_caps),
            Color::Black => (self.black_stones, self.black_caps),
        }
    }

    /// Stable hash of size, side to move and full board contents.
    /// Keys the transposition table and the analysis caches.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = rustc_hash::FxHasher::default();
        self.board.size().hash(&mut hasher);
        self.to_move.hash(&mut hasher);
        for sq in self.board.squares() {
            if let Some(stack) = self.board.stack_at(sq) {
                stack.hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    // ========================================================================
    // MOVE GENERATION
    // ========================================================================

    /// All legal moves for the side to move. Deterministic and pure;
    /// an exhausted position simply yields an empty list.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.result.is_terminal() {
            return vec![];
        }

        let mut moves = Vec::new();
        self.generate_placements(&mut moves);
        if !self.in_opening() {
            self.generate_spreads(&mut moves);
        }
        moves
    }

    fn generate_placements(&self, moves: &mut Vec<Move>) {
        // During the opening the placed piece is the opponent's, so the
        // opponent's reserve is the one that must hold a stone.
        let charged = if self.in_opening() {
            self.to_move.opponent()
        } else {
            self.to_move
        };
        let (stones, caps) = self.reserves(charged);

        for sq in self.board.squares() {
            if !self.board.can_place_on(sq) {
                continue;
            }
            if self.in_opening() {
                if stones > 0 {
                    moves.push(Move::Place {
                        square: sq,
                        role: Role::Flat,
                    });
                }
                continue;
            }
            if stones > 0 {
                moves.push(Move::Place {
                    square: sq,
                    role: Role::Flat,
                });
                moves.push(Move::Place {
                    square: sq,
                    role: Role::Standing,
                });
            }
            if caps > 0 {
                moves.push(Move::Place {
                    square: sq,
                    role: Role::Cap,
                });
            }
        }
    }

    fn generate_spreads(&self, moves: &mut Vec<Move>) {
        let carry_limit = self.size();

        for sq in self.board.squares() {
            let stack = match self.board.stack_at(sq) {
                Some(s) => s,
                None => continue,
            };
            if stack.controller() != Some(self.to_move) {
                continue;
            }
            let top_is_cap = stack.top().map(|p| p.role == Role::Cap).unwrap_or(false);
            let max_carry = stack.height().min(carry_limit);

            for &direction in &DIRECTIONS {
                let reach = self.reachable_distance(sq, direction, top_is_cap);
                if reach == 0 {
                    continue;
                }
                for carry in 1..=max_carry {
                    for drops in drop_sequences(carry as u8, reach) {
                        let mv = Move::Spread {
                            square: sq,
                            direction,
                            drops,
                        };
                        // Legality is settled by simulation: static reach
                        // alone cannot see that a standing stone only yields
                        // to a lone capstone on the final step.
                        if self.apply_move(&mv).is_ok() {
                            moves.push(mv);
                        }
                    }
                }
            }
        }
    }

    /// How many steps a spread from `from` can take before hitting an
    /// impassable stack. A standing stone is counted as reachable when the
    /// moving top piece is a capstone, since it may be flattened as the
    /// final step; whether that actually works out is left to simulation.
    fn reachable_distance(&self, from: Square, direction: Direction, top_is_cap: bool) -> usize {
        let mut distance = 0;
        let mut current = from;
        loop {
            current = current.neighbor(direction);
            let stack = match self.board.stack_at(current) {
                Some(s) => s,
                None => break,
            };
            match stack.top().map(|p| p.role) {
                None | Some(Role::Flat) => distance += 1,
                Some(Role::Standing) => {
                    if top_is_cap {
                        distance += 1;
                    }
                    break;
                }
                Some(Role::Cap) => break,
            }
        }
        distance
    }

    // ========================================================================
    // APPLY MOVE
    // ========================================================================

    /// Apply a move, returning the successor position. Any rule violation
    /// returns `Err` and the original state stays untouched.
    pub fn apply_move(&self, mv: &Move) -> Result<GameState, MoveError> {
        if self.result.is_terminal() {
            return Err(MoveError::GameOver);
        }

        match mv {
            Move::Place { square, role } => self.apply_placement(*square, *role),
            Move::Spread {
                square,
                direction,
                drops,
            } => {
                let board = self.apply_spread(*square, *direction, drops)?;
                Ok(self.finish_move(
                    board,
                    self.white_stones,
                    self.white_caps,
                    self.black_stones,
                    self.black_caps,
                ))
            }
        }
    }

    fn apply_placement(&self, square: Square, role: Role) -> Result<GameState, MoveError> {
        if !square.is_valid(self.size()) {
            return Err(MoveError::OffBoard);
        }
        if !self.board.can_place_on(square) {
            return Err(MoveError::Occupied);
        }
        if self.in_opening() && role != Role::Flat {
            return Err(MoveError::OpeningRestriction);
        }

        let piece_color = if self.in_opening() {
            self.to_move.opponent()
        } else {
            self.to_move
        };

        let (mut ws, mut wc, mut bs, mut bc) = (
            self.white_stones,
            self.white_caps,
            self.black_stones,
            self.black_caps,
        );
        {
            let (stones, caps) = match piece_color {
                Color::White => (&mut ws, &mut wc),
                Color::Black => (&mut bs, &mut bc),
            };
            match role {
                Role::Flat | Role::Standing => {
                    if *stones == 0 {
                        return Err(MoveError::EmptyReserve(role));
                    }
                    *stones -= 1;
                }
                Role::Cap => {
                    if *caps == 0 {
                        return Err(MoveError::EmptyReserve(role));
                    }
                    *caps -= 1;
                }
            }
        }

        let board = self.board.place_piece(square, Piece::new(role, piece_color));
        Ok(self.finish_move(board, ws, wc, bs, bc))
    }

    fn apply_spread(
        &self,
        square: Square,
        direction: Direction,
        drops: &[u8],
    ) -> Result<Board, MoveError> {
        if self.in_opening() {
            return Err(MoveError::OpeningRestriction);
        }
        if drops.is_empty() || drops.iter().any(|&d| d == 0) {
            return Err(MoveError::BadDropSequence);
        }

        let source = self.board.stack_at(square).ok_or(MoveError::OffBoard)?;
        if source.controller() != Some(self.to_move) {
            return Err(MoveError::NotYourStack);
        }

        let carried: usize = drops.iter().map(|&d| d as usize).sum();
        if carried > source.height() || carried > self.size() {
            return Err(MoveError::CarryLimit {
                carried,
                height: source.height(),
                limit: self.size(),
            });
        }

        let mut remaining = source.clone();
        let mut hand = remaining
            .take_top(carried)
            .ok_or(MoveError::BadDropSequence)?;
        let mut board = self.board.set_stack(square, remaining);

        let mut current = square;
        for (step, &drop) in drops.iter().enumerate() {
            current = current.neighbor(direction);
            let mut target = board.stack_at(current).ok_or(MoveError::OffBoard)?.clone();

            match target.top().map(|p| p.role) {
                Some(Role::Cap) => return Err(MoveError::Blocked(current)),
                Some(Role::Standing) => {
                    // Only a lone capstone on the final step may land here
                    let is_last = step == drops.len() - 1;
                    let lone_cap = drop == 1
                        && hand.len() == 1
                        && hand[0].role == Role::Cap;
                    if !(is_last && lone_cap) {
                        return Err(MoveError::Blocked(current));
                    }
                    target.flatten_top();
                }
                _ => {}
            }

            let dropped: Vec<Piece> = hand.drain(..drop as usize).collect();
            target.extend(dropped);
            board = board.set_stack(current, target);
        }

        Ok(board)
    }

    fn finish_move(&self, board: Board, ws: u8, wc: u8, bs: u8, bc: u8) -> GameState {
        let mover = self.to_move;
        let mut next = GameState {
            board,
            to_move: mover.opponent(),
            white_stones: ws,
            white_caps: wc,
            black_stones: bs,
            black_caps: bc,
            ply: self.ply + 1,
            result: GameResult::Ongoing,
        };
        next.result = next.resolve_result(mover);
        next
    }

    // ========================================================================
    // RESULT DETECTION
    // ========================================================================

    /// Decide the result, testing the mover's road first: a spread that
    /// completes both roads at once is a win for whoever moved.
    fn resolve_result(&self, mover: Color) -> GameResult {
        if analysis::has_road(&self.board, mover) {
            return GameResult::RoadWin(mover);
        }
        if analysis::has_road(&self.board, mover.opponent()) {
            return GameResult::RoadWin(mover.opponent());
        }

        let white_out = self.white_stones == 0 && self.white_caps == 0;
        let black_out = self.black_stones == 0 && self.black_caps == 0;
        if self.board.is_full() || white_out || black_out {
            let white_flats = self.board.count_flat_tops(Color::White);
            let black_flats = self.board.count_flat_tops(Color::Black);
            return match white_flats.cmp(&black_flats) {
                std::cmp::Ordering::Greater => GameResult::FlatWin(Color::White),
                std::cmp::Ordering::Less => GameResult::FlatWin(Color::Black),
                std::cmp::Ordering::Equal => GameResult::Draw,
            };
        }

        GameResult::Ongoing
    }
}

// ============================================================================
// DROP SEQUENCES
// ============================================================================

/// All ways to split `total` pieces over at most `max_steps` drops,
/// every drop taking at least one piece.
fn drop_sequences(total: u8, max_steps: usize) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let mut prefix = Vec::new();
    extend_sequence(total, max_steps, &mut prefix, &mut out);
    out
}

fn extend_sequence(left: u8, steps_left: usize, prefix: &mut Vec<u8>, out: &mut Vec<Vec<u8>>) {
    if left == 0 {
        if !prefix.is_empty() {
            out.push(prefix.clone());
        }
        return;
    }
    if steps_left == 0 {
        return;
    }
    for take in 1..=left {
        prefix.push(take);
        extend_sequence(left - take, steps_left - 1, prefix, out);
        prefix.pop();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn played_out(size: usize, notated: &[&str]) -> GameState {
        let mut state = GameState::new(size);
        for text in notated {
            let mv = Move::parse(text).expect("test move parses");
            state = state.apply_move(&mv).expect("test move applies");
        }
        state
    }

    #[test]
    fn test_opening_places_opponent_flat() {
        let state = GameState::new(5);
        assert!(state.in_opening());

        // Every opening move is a flat placement
        let moves = state.legal_moves();
        assert_eq!(moves.len(), 25);
        assert!(moves
            .iter()
            .all(|m| matches!(m, Move::Place { role: Role::Flat, .. })));

        // White's first placement puts down a black stone and flips the turn
        let mv = Move::Place {
            square: Square::new(2, 2),
            role: Role::Flat,
        };
        let next = state.apply_move(&mv).unwrap();
        assert_eq!(
            next.board().top_at(Square::new(2, 2)),
            Some(Piece::flat(Color::Black))
        );
        assert_eq!(next.current_player(), Color::Black);
        assert_eq!(next.reserves(Color::Black).0, 20);
        assert_eq!(next.reserves(Color::White).0, 21);
    }

    #[test]
    fn test_opening_rejects_standing_and_spread() {
        let state = GameState::new(5);
        let standing = Move::Place {
            square: Square::new(0, 0),
            role: Role::Standing,
        };
        assert_eq!(
            state.apply_move(&standing),
            Err(MoveError::OpeningRestriction)
        );
    }

    #[test]
    fn test_reserve_sum_invariant_over_playout() {
        let state = played_out(5, &["a1", "e5", "c3", "c4", "d3", "d4", "c3>1", "c4-1"]);
        for &color in &[Color::White, Color::Black] {
            let (stones, caps) = state.board().count_stones_and_caps(color);
            let (rs, rc) = state.reserves(color);
            assert_eq!(stones + rs as usize, starting_stones(5) as usize);
            assert_eq!(caps + rc as usize, starting_capstones(5) as usize);
        }
    }

    #[test]
    fn test_legality_closure() {
        // Every generated move must apply cleanly, several plies deep
        let mut state = GameState::new(4);
        for _ in 0..6 {
            let moves = state.legal_moves();
            assert!(!moves.is_empty());
            for mv in &moves {
                let next = state.apply_move(mv).expect("generated move must apply");
                assert_eq!(next.ply(), state.ply() + 1);
            }
            // Walk down a fixed branch to vary the position
            state = state.apply_move(&moves[moves.len() / 2]).unwrap();
        }
    }

    #[test]
    fn test_spread_carry_limit() {
        // White stacks c3 onto the black flat at c2: c2 = [B, W], height 2
        let state = played_out(5, &["e5", "a1", "c3", "c2", "c3-1", "d5"]);
        let c2 = Square::new(1, 2);
        assert_eq!(state.board().stack_at(c2).unwrap().height(), 2);
        assert_eq!(state.board().stack_at(c2).unwrap().controller(), Some(Color::White));

        let over = Move::Spread {
            square: c2,
            direction: Direction::North,
            drops: vec![9],
        };
        assert!(matches!(
            state.apply_move(&over),
            Err(MoveError::CarryLimit { carried: 9, .. })
        ));
    }

    #[test]
    fn test_capstone_flattens_standing_as_lone_final_step() {
        // White: flat d2 then cap c2 (5x5 has one cap); Black: standing b2
        let state = played_out(5, &["a5", "e5", "d2", "Sb2", "Cc2", "e1"]);

        let cap_sq = Square::new(1, 2);
        let wall_sq = Square::new(1, 1);
        assert_eq!(
            state.board().top_at(wall_sq).map(|p| p.role),
            Some(Role::Standing)
        );

        // Lone capstone onto the wall: legal, wall becomes flat
        let flatten = Move::Spread {
            square: cap_sq,
            direction: Direction::West,
            drops: vec![1],
        };
        let next = state.apply_move(&flatten).unwrap();
        let wall = next.board().stack_at(wall_sq).unwrap();
        assert_eq!(wall.top().map(|p| p.role), Some(Role::Cap));
        assert_eq!(
            wall.pieces().next().map(|p| p.role),
            Some(Role::Flat),
            "standing stone must be flattened under the capstone"
        );

        // Nothing may land on a capstone, lone or otherwise
        let onto_cap = Move::Spread {
            square: Square::new(1, 3),
            direction: Direction::West,
            drops: vec![1],
        };
        assert_eq!(state.apply_move(&onto_cap), Err(MoveError::Blocked(cap_sq)));
    }

    #[test]
    fn test_standing_blocks_non_cap() {
        // White flat at c2, black wall at b2
        let state = played_out(5, &["a5", "e5", "c2", "Sb2"]);
        let onto_wall = Move::Spread {
            square: Square::new(1, 2),
            direction: Direction::West,
            drops: vec![1],
        };
        assert_eq!(
            state.apply_move(&onto_wall),
            Err(MoveError::Blocked(Square::new(1, 1)))
        );
    }

    #[test]
    fn test_generated_spreads_respect_walls() {
        let state = played_out(5, &["a5", "e5", "c2", "Sb2"]);
        // White flat at c2, black wall at b2: no generated spread lands west
        let illegal = state.legal_moves().into_iter().any(|m| {
            matches!(
                m,
                Move::Spread {
                    square: Square { row: 1, col: 2 },
                    direction: Direction::West,
                    ..
                }
            )
        });
        assert!(!illegal);
    }

    #[test]
    fn test_road_win_detected_on_completion() {
        // White builds a1..e1 along the south edge; black keeps out of row 0
        let state = played_out(
            5,
            &[
                "a5", "e5", "a1", "b5", "b1", "c5", "c1", "d5", "d1", "d4",
            ],
        );
        assert_eq!(state.result(), GameResult::Ongoing);

        let winning = Move::parse("e1").unwrap();
        let done = state.apply_move(&winning).unwrap();
        assert_eq!(done.result(), GameResult::RoadWin(Color::White));
        assert!(done.legal_moves().is_empty());
        assert_eq!(done.apply_move(&winning), Err(MoveError::GameOver));
    }

    #[test]
    fn test_flat_win_on_full_board() {
        // 3x3, no capstones: fill the board and count flat tops
        let mut state = GameState::new(3);
        while !state.result().is_terminal() {
            let moves = state.legal_moves();
            // Prefer flat placements to fill the board quickly
            let mv = moves
                .iter()
                .find(|m| matches!(m, Move::Place { role: Role::Flat, .. }))
                .or_else(|| moves.first())
                .cloned()
                .expect("ongoing position must have a move");
            state = state.apply_move(&mv).unwrap();
        }
        assert!(matches!(
            state.result(),
            GameResult::FlatWin(_) | GameResult::Draw | GameResult::RoadWin(_)
        ));
    }

    #[test]
    fn test_random_playout_stays_legal() {
        use rand::prelude::*;
        use rand_chacha::ChaCha8Rng;

        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let mut state = GameState::new(5);

        for _ in 0..50 {
            if state.result().is_terminal() {
                break;
            }
            let moves = state.legal_moves();
            assert!(!moves.is_empty(), "ongoing position must have moves");
            let mv = &moves[rng.gen_range(0..moves.len())];
            state = state.apply_move(mv).expect("generated move applies");
        }

        for &color in &[Color::White, Color::Black] {
            let (stones, caps) = state.board().count_stones_and_caps(color);
            let (rs, rc) = state.reserves(color);
            assert_eq!(stones + rs as usize, starting_stones(5) as usize);
            assert_eq!(caps + rc as usize, starting_capstones(5) as usize);
        }
    }

    #[test]
    fn test_drop_sequences() {
        // 3 pieces over up to 2 steps: [3], [1,2], [2,1]
        let seqs = drop_sequences(3, 2);
        assert_eq!(seqs.len(), 3);
        assert!(seqs.contains(&vec![3]));
        assert!(seqs.contains(&vec![1, 2]));
        assert!(seqs.contains(&vec![2, 1]));
        for s in &seqs {
            assert_eq!(s.iter().sum::<u8>(), 3);
        }

        assert!(drop_sequences(2, 0).is_empty());
    }

    #[test]
    fn test_fingerprint_tracks_position() {
        let a = played_out(5, &["a1", "e5", "c3"]);
        let b = played_out(5, &["a1", "e5", "c3"]);
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = played_out(5, &["a1", "e5", "d3"]);
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_from_board_derives_reserves() {
        let board = Board::new(5)
            .place_piece(Square::new(0, 0), Piece::flat(Color::White))
            .place_piece(Square::new(1, 0), Piece::flat(Color::Black));
        let state = GameState::from_board(board, Color::White).unwrap();
        assert_eq!(state.reserves(Color::White).0, 20);
        assert_eq!(state.reserves(Color::Black).0, 20);
        assert_eq!(state.result(), GameResult::Ongoing);
    }
}
