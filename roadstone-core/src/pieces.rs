//! Piece types, colors and stacks

use serde::{Deserialize, Serialize};

/// Player color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

/// What a piece is, independent of who owns it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Flat,
    Standing,
    Cap,
}

/// A single piece
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub role: Role,
    pub color: Color,
}

impl Piece {
    pub const fn new(role: Role, color: Color) -> Self {
        Self { role, color }
    }

    pub const fn flat(color: Color) -> Self {
        Self::new(Role::Flat, color)
    }

    /// Counts toward a road (flats and capstones do, standing stones don't)
    pub fn is_road_piece(self) -> bool {
        matches!(self.role, Role::Flat | Role::Cap)
    }

    /// Can another stack drop pieces on top of this one at all?
    /// Standing stones only yield to a lone capstone, capstones to nothing.
    pub fn blocks_stacking(self) -> bool {
        matches!(self.role, Role::Standing | Role::Cap)
    }
}

/// Flat-stone reserve for a given board size
pub fn starting_stones(size: usize) -> u8 {
    match size {
        3 => 10,
        4 => 16,
        5 => 21,
        6 => 30,
        7 => 40,
        8 => 50,
        _ => 0,
    }
}

/// Capstone reserve for a given board size
pub fn starting_capstones(size: usize) -> u8 {
    match size {
        3 | 4 => 0,
        5 | 6 => 1,
        7 | 8 => 2,
        _ => 0,
    }
}

/// An ordered pile of pieces on one cell, bottom to top
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceStack {
    pieces: Vec<Piece>,
}

impl PieceStack {
    pub fn new() -> Self {
        Self { pieces: Vec::new() }
    }

    pub fn from_pieces(pieces: Vec<Piece>) -> Self {
        Self { pieces }
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn height(&self) -> usize {
        self.pieces.len()
    }

    /// The visible piece, if any
    pub fn top(&self) -> Option<Piece> {
        self.pieces.last().copied()
    }

    /// Who controls this cell (owner of the top piece)
    pub fn controller(&self) -> Option<Color> {
        self.top().map(|p| p.color)
    }

    /// True iff the top piece lets `color` count this cell for a road
    pub fn controls_road(&self, color: Color) -> bool {
        self.top()
            .map(|p| p.color == color && p.is_road_piece())
            .unwrap_or(false)
    }

    pub fn push(&mut self, piece: Piece) {
        self.pieces.push(piece);
    }

    /// Remove the top `count` pieces, returned bottom-to-top.
    /// Returns `None` without touching the stack if it is too short.
    pub fn take_top(&mut self, count: usize) -> Option<Vec<Piece>> {
        if count == 0 || count > self.pieces.len() {
            return None;
        }
        Some(self.pieces.split_off(self.pieces.len() - count))
    }

    /// Drop `pieces` (bottom-to-top) onto this stack
    pub fn extend(&mut self, pieces: impl IntoIterator<Item = Piece>) {
        self.pieces.extend(pieces);
    }

    /// Convert a standing top stone to flat (capstone landing)
    pub fn flatten_top(&mut self) {
        if let Some(top) = self.pieces.last_mut() {
            if top.role == Role::Standing {
                top.role = Role::Flat;
            }
        }
    }

    /// Iterate pieces bottom-to-top
    pub fn pieces(&self) -> impl Iterator<Item = Piece> + '_ {
        self.pieces.iter().copied()
    }

    /// Pieces of `color` anywhere in the stack (for reserve accounting)
    pub fn count_color(&self, color: Color) -> usize {
        self.pieces.iter().filter(|p| p.color == color).count()
    }
}
