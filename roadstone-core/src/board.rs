//! Square grid geometry and the copy-on-write board

use crate::pieces::{Color, Piece, PieceStack, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Smallest supported board
pub const MIN_BOARD_SIZE: usize = 3;
/// Largest supported board
pub const MAX_BOARD_SIZE: usize = 8;

/// Board coordinates, 0-indexed. Row 0 is the south edge, column 0 the
/// west edge. Signed so that off-board neighbor probes are representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square {
    pub row: i8,
    pub col: i8,
}

impl Square {
    pub const fn new(row: i8, col: i8) -> Self {
        Self { row, col }
    }

    /// Check if this square is on a board of the given size
    pub fn is_valid(&self, size: usize) -> bool {
        self.row >= 0 && self.col >= 0 && (self.row as usize) < size && (self.col as usize) < size
    }

    /// Neighbor square in a direction (may be off-board)
    pub fn neighbor(&self, direction: Direction) -> Square {
        let (dr, dc) = direction.offset();
        Square::new(self.row + dr, self.col + dc)
    }

    /// On-board orthogonal neighbors
    pub fn neighbors(&self, size: usize) -> impl Iterator<Item = Square> + '_ {
        let sq = *self;
        DIRECTIONS
            .iter()
            .map(move |&d| sq.neighbor(d))
            .filter(move |n| n.is_valid(size))
    }
}

/// The four spread directions, with their notation symbols
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

pub const DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

impl Direction {
    /// (row, col) delta
    pub fn offset(self) -> (i8, i8) {
        match self {
            Direction::North => (1, 0),
            Direction::East => (0, 1),
            Direction::South => (-1, 0),
            Direction::West => (0, -1),
        }
    }

    /// Notation symbol: `+` north, `>` east, `-` south, `<` west
    pub fn symbol(self) -> char {
        match self {
            Direction::North => '+',
            Direction::East => '>',
            Direction::South => '-',
            Direction::West => '<',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Direction::North),
            '>' => Some(Direction::East),
            '-' => Some(Direction::South),
            '<' => Some(Direction::West),
            _ => None,
        }
    }
}

/// The playing surface: a size x size grid of piece stacks.
///
/// Rows are shared between board values (`Arc`), so applying a move
/// clones one row and the row table, never the whole grid. `set_stack`
/// on an unchanged cell shares every row with its input, which callers
/// may detect with `Board::shares_all_rows`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    rows: Vec<Arc<Vec<PieceStack>>>,
}

impl Board {
    /// Empty board. Sizes outside [MIN_BOARD_SIZE, MAX_BOARD_SIZE] are
    /// clamped rather than rejected; callers validate at the boundary.
    pub fn new(size: usize) -> Self {
        let size = size.clamp(MIN_BOARD_SIZE, MAX_BOARD_SIZE);
        let rows = (0..size)
            .map(|_| Arc::new(vec![PieceStack::new(); size]))
            .collect();
        Self { size, rows }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Stack at a square, or `None` if the square is off-board
    pub fn stack_at(&self, sq: Square) -> Option<&PieceStack> {
        if !sq.is_valid(self.size) {
            return None;
        }
        Some(&self.rows[sq.row as usize][sq.col as usize])
    }

    /// Top piece at a square (off-board and empty cells both give `None`)
    pub fn top_at(&self, sq: Square) -> Option<Piece> {
        self.stack_at(sq).and_then(|s| s.top())
    }

    /// Placement from reserve is only legal on an empty, on-board cell
    pub fn can_place_on(&self, sq: Square) -> bool {
        self.stack_at(sq).map(|s| s.is_empty()).unwrap_or(false)
    }

    /// Board with `piece` placed at `sq`, or an unchanged board if the
    /// cell cannot accept a placement. Callers pre-check `can_place_on`.
    pub fn place_piece(&self, sq: Square, piece: Piece) -> Board {
        if !self.can_place_on(sq) {
            return self.clone();
        }
        let mut stack = PieceStack::new();
        stack.push(piece);
        self.set_stack(sq, stack)
    }

    /// Board with the stack at `sq` replaced. Only the affected row is
    /// copied; if the new stack equals the old one (or `sq` is off-board)
    /// the result shares every row with `self`.
    pub fn set_stack(&self, sq: Square, stack: PieceStack) -> Board {
        let existing = match self.stack_at(sq) {
            Some(s) => s,
            None => return self.clone(),
        };
        if *existing == stack {
            return self.clone();
        }

        let mut rows = self.rows.clone();
        let mut row = (*rows[sq.row as usize]).clone();
        row[sq.col as usize] = stack;
        rows[sq.row as usize] = Arc::new(row);
        Board {
            size: self.size,
            rows,
        }
    }

    /// All on-board squares, south-west to north-east
    pub fn squares(&self) -> impl Iterator<Item = Square> {
        let size = self.size as i8;
        (0..size).flat_map(move |row| (0..size).map(move |col| Square::new(row, col)))
    }

    /// True iff no cell is empty (flat-count endgame trigger)
    pub fn is_full(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(|s| !s.is_empty()))
    }

    /// Cells whose top piece is a flat of `color`
    pub fn count_flat_tops(&self, color: Color) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .filter(|s| {
                s.top()
                    .map(|p| p.color == color && p.role == Role::Flat)
                    .unwrap_or(false)
            })
            .count()
    }

    /// Pieces of `color` anywhere on the board (reserve-sum invariant)
    pub fn count_pieces(&self, color: Color) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .map(|s| s.count_color(color))
            .sum()
    }

    /// Per-pool piece counts for `color`: (flat/standing stones, capstones).
    /// Flattening turns standing into flat, so the stone pool is stable.
    pub fn count_stones_and_caps(&self, color: Color) -> (usize, usize) {
        let mut stones = 0;
        let mut caps = 0;
        for stack in self.rows.iter().flat_map(|row| row.iter()) {
            for piece in stack.pieces() {
                if piece.color != color {
                    continue;
                }
                match piece.role {
                    Role::Cap => caps += 1,
                    _ => stones += 1,
                }
            }
        }
        (stones, caps)
    }

    /// Row-identity check used by the structural sharing tests
    pub fn shares_all_rows(&self, other: &Board) -> bool {
        self.size == other.size
            && self
                .rows
                .iter()
                .zip(other.rows.iter())
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }

    /// Rows shared with `other` (identity, not equality)
    pub fn shared_row_count(&self, other: &Board) -> usize {
        self.rows
            .iter()
            .zip(other.rows.iter())
            .filter(|(a, b)| Arc::ptr_eq(a, b))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::{Color, Role};

    #[test]
    fn test_square_validity() {
        assert!(Square::new(0, 0).is_valid(5));
        assert!(Square::new(4, 4).is_valid(5));
        assert!(!Square::new(5, 0).is_valid(5));
        assert!(!Square::new(-1, 2).is_valid(5));
        assert!(!Square::new(2, 5).is_valid(5));
    }

    #[test]
    fn test_neighbors_clipped() {
        let corner = Square::new(0, 0);
        assert_eq!(corner.neighbors(5).count(), 2);
        let center = Square::new(2, 2);
        assert_eq!(center.neighbors(5).count(), 4);
    }

    #[test]
    fn test_direction_symbols() {
        for d in DIRECTIONS {
            assert_eq!(Direction::from_symbol(d.symbol()), Some(d));
        }
        assert_eq!(Direction::from_symbol('x'), None);
    }

    #[test]
    fn test_place_on_empty_only() {
        let board = Board::new(5);
        let sq = Square::new(2, 2);
        let board = board.place_piece(sq, Piece::flat(Color::White));
        assert_eq!(board.top_at(sq), Some(Piece::flat(Color::White)));

        // Second placement on the same cell is a no-op
        let again = board.place_piece(sq, Piece::flat(Color::Black));
        assert_eq!(again.top_at(sq), Some(Piece::flat(Color::White)));
    }

    #[test]
    fn test_set_stack_structural_sharing() {
        let board = Board::new(5);
        let sq = Square::new(1, 3);

        // Unchanged stack: every row identity-shared
        let same = board.set_stack(sq, PieceStack::new());
        assert!(same.shares_all_rows(&board));

        // One changed cell: exactly one row replaced
        let mut stack = PieceStack::new();
        stack.push(Piece::new(Role::Standing, Color::Black));
        let changed = board.set_stack(sq, stack);
        assert_eq!(changed.shared_row_count(&board), 4);
        assert_eq!(
            changed.top_at(sq),
            Some(Piece::new(Role::Standing, Color::Black))
        );
    }

    #[test]
    fn test_off_board_probes_are_safe() {
        let board = Board::new(5);
        let off = Square::new(-1, 9);
        assert!(board.stack_at(off).is_none());
        assert!(board.top_at(off).is_none());
        assert!(!board.can_place_on(off));
        // set_stack on an off-board square returns an unchanged board
        let same = board.set_stack(off, PieceStack::new());
        assert!(same.shares_all_rows(&board));
    }
}
