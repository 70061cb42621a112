//! Road and threat connectivity analysis
//!
//! All functions here are pure in (board, color); identical input gives
//! identical output regardless of call order, which the search layer's
//! transposition caching depends on.

use crate::board::{Board, Square};
use crate::game::GameState;
use crate::pieces::{Color, Piece};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

// ============================================================================
// EDGE SETS
// ============================================================================

/// Which board edges a connected group touches, as a small bitset
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EdgeSet(u8);

impl EdgeSet {
    pub const EMPTY: EdgeSet = EdgeSet(0);
    pub const WEST: EdgeSet = EdgeSet(1);
    pub const EAST: EdgeSet = EdgeSet(2);
    pub const SOUTH: EdgeSet = EdgeSet(4);
    pub const NORTH: EdgeSet = EdgeSet(8);

    pub fn insert(&mut self, other: EdgeSet) {
        self.0 |= other.0;
    }

    pub fn contains(self, other: EdgeSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// West+east or south+north: the group spans the board
    pub fn has_opposite_pair(self) -> bool {
        self.contains(EdgeSet(Self::WEST.0 | Self::EAST.0))
            || self.contains(EdgeSet(Self::SOUTH.0 | Self::NORTH.0))
    }

    /// Edges the square itself lies on
    pub fn of_square(sq: Square, size: usize) -> EdgeSet {
        let mut edges = EdgeSet::EMPTY;
        if sq.col == 0 {
            edges.insert(EdgeSet::WEST);
        }
        if sq.col as usize == size - 1 {
            edges.insert(EdgeSet::EAST);
        }
        if sq.row == 0 {
            edges.insert(EdgeSet::SOUTH);
        }
        if sq.row as usize == size - 1 {
            edges.insert(EdgeSet::NORTH);
        }
        edges
    }
}

// ============================================================================
// ROAD DETECTION
// ============================================================================

/// True iff the cell's top piece lets `color` count it for a road
pub fn controls_road(board: &Board, sq: Square, color: Color) -> bool {
    board
        .stack_at(sq)
        .map(|s| s.controls_road(color))
        .unwrap_or(false)
}

/// Does `color` connect two opposite edges?
///
/// One breadth-first sweep per axis, seeded from every controlled cell on
/// the west (resp. south) edge, short-circuiting as soon as the opposite
/// edge is reached.
pub fn has_road(board: &Board, color: Color) -> bool {
    let size = board.size() as i8;
    let west_seeds: Vec<Square> = (0..size).map(|row| Square::new(row, 0)).collect();
    let south_seeds: Vec<Square> = (0..size).map(|col| Square::new(0, col)).collect();

    edge_search(board, color, &west_seeds, EdgeSet::EAST)
        || edge_search(board, color, &south_seeds, EdgeSet::NORTH)
}

fn edge_search(board: &Board, color: Color, seeds: &[Square], target: EdgeSet) -> bool {
    let size = board.size();
    let mut visited = vec![false; size * size];
    let mut queue = VecDeque::new();

    for &seed in seeds {
        if controls_road(board, seed, color) && !visited[cell_index(seed, size)] {
            visited[cell_index(seed, size)] = true;
            queue.push_back(seed);
        }
    }

    while let Some(sq) = queue.pop_front() {
        if EdgeSet::of_square(sq, size).contains(target) {
            return true;
        }
        for next in sq.neighbors(size) {
            let idx = cell_index(next, size);
            if !visited[idx] && controls_road(board, next, color) {
                visited[idx] = true;
                queue.push_back(next);
            }
        }
    }

    false
}

/// All edges reachable from `from` through `color`-controlled cells, in a
/// single traversal. Callers asking "does this cell bridge two edges" call
/// this once and inspect the returned set; never once per edge.
pub fn reachable_edges(board: &Board, from: Square, color: Color) -> EdgeSet {
    if !controls_road(board, from, color) {
        return EdgeSet::EMPTY;
    }

    let size = board.size();
    let mut visited = vec![false; size * size];
    let mut queue = VecDeque::new();
    let mut edges = EdgeSet::EMPTY;

    visited[cell_index(from, size)] = true;
    queue.push_back(from);

    while let Some(sq) = queue.pop_front() {
        edges.insert(EdgeSet::of_square(sq, size));
        for next in sq.neighbors(size) {
            let idx = cell_index(next, size);
            if !visited[idx] && controls_road(board, next, color) {
                visited[idx] = true;
                queue.push_back(next);
            }
        }
    }

    edges
}

fn cell_index(sq: Square, size: usize) -> usize {
    sq.row as usize * size + sq.col as usize
}

// ============================================================================
// THREAT COUNTING
// ============================================================================

/// Empty cells where a flat of `color` would complete a road, counted up
/// to `cap` (fork logic only needs to tell 0, 1 and "two or more" apart).
pub fn count_threats(board: &Board, color: Color, cap: usize) -> usize {
    if cap == 0 {
        return 0;
    }
    let mut found = 0;
    for sq in board.squares() {
        if !board.can_place_on(sq) {
            continue;
        }
        let probe = board.place_piece(sq, Piece::flat(color));
        if has_road(&probe, color) {
            found += 1;
            if found >= cap {
                break;
            }
        }
    }
    found
}

/// Squares counted by [`count_threats`], for callers that need the cells
/// themselves rather than how many there are
pub fn threat_squares(board: &Board, color: Color, cap: usize) -> Vec<Square> {
    let mut found = Vec::new();
    if cap == 0 {
        return found;
    }
    for sq in board.squares() {
        if !board.can_place_on(sq) {
            continue;
        }
        let probe = board.place_piece(sq, Piece::flat(color));
        if has_road(&probe, color) {
            found.push(sq);
            if found.len() >= cap {
                break;
            }
        }
    }
    found
}

/// Memo for threat counts within one engine decision, keyed by position
/// fingerprint. Cleared when the decision starts.
#[derive(Debug, Default)]
pub struct ThreatCache {
    entries: FxHashMap<(u64, Color, usize), usize>,
}

impl ThreatCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_threats(&mut self, state: &GameState, color: Color, cap: usize) -> usize {
        let key = (state.fingerprint(), color, cap);
        if let Some(&cached) = self.entries.get(&key) {
            return cached;
        }
        let count = count_threats(state.board(), color, cap);
        self.entries.insert(key, count);
        count
    }
}

// ============================================================================
// CHAIN HEURISTICS
// ============================================================================

const BRIDGE_SCORE: f32 = 10.0;
const PARTIAL_SCORE: f32 = 3.0;
const BORDER_SCORE: f32 = 1.0;

/// Heuristic value of playing at `sq` for `color`, judged by what the
/// neighboring chains already reach: joining chains that span both
/// opposite edges beats extending a single-edge chain, which beats merely
/// touching a border.
pub fn chain_extension(board: &Board, sq: Square, color: Color) -> f32 {
    let size = board.size();
    let mut reached = EdgeSet::EMPTY;
    let mut has_chain_neighbor = false;
    for neighbor in sq.neighbors(size) {
        if controls_road(board, neighbor, color) {
            has_chain_neighbor = true;
            reached.insert(reachable_edges(board, neighbor, color));
        }
    }
    // The candidate square contributes its own borders to the chain
    reached.insert(EdgeSet::of_square(sq, size));

    if reached.has_opposite_pair() {
        BRIDGE_SCORE
    } else if has_chain_neighbor && !reached.is_empty() {
        PARTIAL_SCORE
    } else if !EdgeSet::of_square(sq, size).is_empty() {
        BORDER_SCORE
    } else {
        0.0
    }
}

/// Longest `color`-controlled chain and the edges it reaches.
/// One sweep over the board; each cell is visited once.
pub fn best_chain(board: &Board, color: Color) -> (usize, EdgeSet) {
    let size = board.size();
    let mut visited = vec![false; size * size];
    let mut best_len = 0;
    let mut best_edges = EdgeSet::EMPTY;

    for seed in board.squares() {
        let idx = cell_index(seed, size);
        if visited[idx] || !controls_road(board, seed, color) {
            continue;
        }

        let mut len = 0;
        let mut edges = EdgeSet::EMPTY;
        let mut queue = VecDeque::new();
        visited[idx] = true;
        queue.push_back(seed);

        while let Some(sq) = queue.pop_front() {
            len += 1;
            edges.insert(EdgeSet::of_square(sq, size));
            for next in sq.neighbors(size) {
                let next_idx = cell_index(next, size);
                if !visited[next_idx] && controls_road(board, next, color) {
                    visited[next_idx] = true;
                    queue.push_back(next);
                }
            }
        }

        if len > best_len || (len == best_len && edges.count() > best_edges.count()) {
            best_len = len;
            best_edges = edges;
        }
    }

    (best_len, best_edges)
}

// ============================================================================
// TESTS
// ============================================================================
