//! Compact move notation for the application boundary
//!
//! A placement is an optional role prefix (`S` standing, `C` capstone,
//! none for flat) followed by a column letter and 1-based row: `Sc3`.
//! A spread is an optional carry digit, a square, a direction symbol
//! (`+` north, `>` east, `-` south, `<` west) and optional per-step drop
//! digits: `3c3>12`. Remote moves arrive as these strings; anything
//! structurally malformed is rejected here, before the rules layer sees it.

use crate::board::{Direction, Square, MAX_BOARD_SIZE};
use crate::game::Move;
use crate::pieces::Role;
use std::fmt;
use thiserror::Error;

/// Why a move string could not be parsed
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("empty move string")]
    Empty,
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("missing or invalid square")]
    BadSquare,
    #[error("drop digits sum to {sum} but the carry count is {carry}")]
    DropMismatch { carry: u8, sum: u8 },
    #[error("a role prefix cannot combine with a spread")]
    RoleOnSpread,
    #[error("carry count given without a direction")]
    CarryWithoutDirection,
}

impl Move {
    /// Parse a move from its compact notation
    pub fn parse(text: &str) -> Result<Move, NotationError> {
        let mut chars = text.chars().peekable();

        // Optional leading role prefix or carry digit
        let mut role = None;
        let mut carry = None;
        match chars.peek() {
            None => return Err(NotationError::Empty),
            Some('S') => {
                role = Some(Role::Standing);
                chars.next();
            }
            Some('C') => {
                role = Some(Role::Cap);
                chars.next();
            }
            Some(&c) if c.is_ascii_digit() => {
                carry = Some(parse_count_digit(c)?);
                chars.next();
            }
            _ => {}
        }

        let square = parse_square(&mut chars)?;

        // No direction symbol: this is a placement
        let direction = match chars.next() {
            None => {
                if carry.is_some() {
                    return Err(NotationError::CarryWithoutDirection);
                }
                return Ok(Move::Place {
                    square,
                    role: role.unwrap_or(Role::Flat),
                });
            }
            Some(c) => Direction::from_symbol(c).ok_or(NotationError::UnexpectedChar(c))?,
        };

        if role.is_some() {
            return Err(NotationError::RoleOnSpread);
        }
        let carry = carry.unwrap_or(1);

        let mut drops = Vec::new();
        for c in chars {
            drops.push(parse_count_digit(c)?);
        }
        if drops.is_empty() {
            drops.push(carry);
        }
        let sum: u8 = drops.iter().sum();
        if sum != carry {
            return Err(NotationError::DropMismatch { carry, sum });
        }

        Ok(Move::Spread {
            square,
            direction,
            drops,
        })
    }

    /// Render this move in compact notation
    pub fn to_notation(&self) -> String {
        self.to_string()
    }
}

fn parse_count_digit(c: char) -> Result<u8, NotationError> {
    let value = c.to_digit(10).ok_or(NotationError::UnexpectedChar(c))? as u8;
    if value == 0 || value as usize > MAX_BOARD_SIZE {
        return Err(NotationError::UnexpectedChar(c));
    }
    Ok(value)
}

fn parse_square(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<Square, NotationError> {
    let col_char = chars.next().ok_or(NotationError::BadSquare)?;
    if !('a'..='h').contains(&col_char) {
        return Err(NotationError::BadSquare);
    }
    let row_char = chars.next().ok_or(NotationError::BadSquare)?;
    if !('1'..='8').contains(&row_char) {
        return Err(NotationError::BadSquare);
    }
    let col = col_char as i8 - 'a' as i8;
    let row = row_char as i8 - '1' as i8;
    Ok(Square::new(row, col))
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Place { square, role } => {
                match role {
                    Role::Flat => {}
                    Role::Standing => write!(f, "S")?,
                    Role::Cap => write!(f, "C")?,
                }
                write_square(f, *square)
            }
            Move::Spread {
                square,
                direction,
                drops,
            } => {
                let carry: u8 = drops.iter().sum();
                if carry != 1 {
                    write!(f, "{}", carry)?;
                }
                write_square(f, *square)?;
                write!(f, "{}", direction.symbol())?;
                if drops.len() > 1 {
                    for d in drops {
                        write!(f, "{}", d)?;
                    }
                }
                Ok(())
            }
        }
    }
}

fn write_square(f: &mut fmt::Formatter<'_>, sq: Square) -> fmt::Result {
    write!(
        f,
        "{}{}",
        (b'a' + sq.col as u8) as char,
        (b'1' + sq.row as u8) as char
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;

    #[test]
    fn test_parse_placements() {
        assert_eq!(
            Move::parse("c3").unwrap(),
            Move::Place {
                square: Square::new(2, 2),
                role: Role::Flat
            }
        );
        assert_eq!(
            Move::parse("Sa1").unwrap(),
            Move::Place {
                square: Square::new(0, 0),
                role: Role::Standing
            }
        );
        assert_eq!(
            Move::parse("Ch8").unwrap(),
            Move::Place {
                square: Square::new(7, 7),
                role: Role::Cap
            }
        );
    }

    #[test]
    fn test_parse_spreads() {
        assert_eq!(
            Move::parse("3c3>12").unwrap(),
            Move::Spread {
                square: Square::new(2, 2),
                direction: Direction::East,
                drops: vec![1, 2]
            }
        );
        // Omitted drops: everything in one step
        assert_eq!(
            Move::parse("2b4+").unwrap(),
            Move::Spread {
                square: Square::new(3, 1),
                direction: Direction::North,
                drops: vec![2]
            }
        );
        // Omitted carry: a single stone
        assert_eq!(
            Move::parse("e5<").unwrap(),
            Move::Spread {
                square: Square::new(4, 4),
                direction: Direction::West,
                drops: vec![1]
            }
        );
    }

    #[test]
    fn test_parse_rejections() {
        assert_eq!(Move::parse(""), Err(NotationError::Empty));
        assert_eq!(Move::parse("i3"), Err(NotationError::BadSquare));
        assert_eq!(Move::parse("c9"), Err(NotationError::BadSquare));
        assert_eq!(Move::parse("c"), Err(NotationError::BadSquare));
        assert!(matches!(
            Move::parse("c3x"),
            Err(NotationError::UnexpectedChar('x'))
        ));
        assert_eq!(
            Move::parse("3c3>13"),
            Err(NotationError::DropMismatch { carry: 3, sum: 4 })
        );
        assert_eq!(Move::parse("Sc3>"), Err(NotationError::RoleOnSpread));
        assert_eq!(Move::parse("3c3"), Err(NotationError::CarryWithoutDirection));
        assert!(matches!(
            Move::parse("0c3>"),
            Err(NotationError::UnexpectedChar('0'))
        ));
        assert!(matches!(
            Move::parse("9c3>"),
            Err(NotationError::UnexpectedChar('9'))
        ));
    }

    #[test]
    fn test_display_round_trip_examples() {
        for text in ["c3", "Sc3", "Ca1", "3c3>12", "c3-", "2d4<11", "5e1+"] {
            let mv = Move::parse(text).unwrap();
            let rendered = mv.to_notation();
            assert_eq!(Move::parse(&rendered).unwrap(), mv, "via {}", rendered);
        }
    }

    #[test]
    fn test_round_trip_generated_moves() {
        // Walk a few plies and round-trip every legal move along the way
        let mut state = GameState::new(5);
        for _ in 0..6 {
            let moves = state.legal_moves();
            for mv in &moves {
                let text = mv.to_notation();
                assert_eq!(&Move::parse(&text).unwrap(), mv, "via {}", text);
            }
            state = state.apply_move(&moves[moves.len() / 3]).unwrap();
        }
    }
}
