//! Move codec.
//!
//! A move is written as a fixed two-character token:
//! - the field index as a base-36 digit
//! - the stone value as a base-36 digit, with negative (blue) values
//!   folded into `MAX_VALUE + 1..=2 * MAX_VALUE`
//!
//! So `-1` is written as digit 16 (`g`) and `-15` as digit 30 (`u`).

use crate::coords::{index_to_coords, FieldIndex, FIELDS};
use crate::rules::Player;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Highest stone value; each player owns stones `1..=MAX_VALUE`
pub const MAX_VALUE: i32 = 15;

/// Alphabet of the encoding, in digit order
pub const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of one encoded move
pub const TOKEN_LEN: usize = 2;

/// Errors from encoding or decoding a single move
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid move token {0:?}")]
    InvalidToken(String),

    #[error("move out of range: field {field_index}, value {stone_value}")]
    OutOfRange {
        field_index: FieldIndex,
        stone_value: i32,
    },
}

/// A single placement: one stone (or a neutral marker) on one field.
///
/// Always in range, but not necessarily legal in any particular game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Move {
    field_index: FieldIndex,
    stone_value: i32,
}

impl Move {
    /// Create a move, or `None` if the field or value is out of range
    pub fn new(field_index: FieldIndex, stone_value: i32) -> Option<Self> {
        (field_index < FIELDS && (-MAX_VALUE..=MAX_VALUE).contains(&stone_value)).then_some(Self {
            field_index,
            stone_value,
        })
    }

    pub const fn field_index(&self) -> FieldIndex {
        self.field_index
    }

    /// Signed stone value; 0 for a neutral marker
    pub const fn stone_value(&self) -> i32 {
        self.stone_value
    }

    /// The player owning the placed stone
    pub fn player(&self) -> Player {
        Player::of_value(self.stone_value)
    }

    /// The two-character token for this move
    pub fn token(&self) -> String {
        let field = BASE36_DIGITS[self.field_index];
        let value = BASE36_DIGITS[value_to_digit(self.stone_value)];
        [char::from(field), char::from(value)].iter().collect()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match index_to_coords(self.field_index) {
            Some(coords) => write!(f, "{}={}", coords, self.stone_value.abs()),
            None => write!(f, "#{}={}", self.field_index, self.stone_value.abs()),
        }
    }
}

/// Fold a signed stone value into `0..=2 * MAX_VALUE`.
pub(crate) fn value_to_digit(stone_value: i32) -> usize {
    if stone_value < 0 {
        (MAX_VALUE - stone_value) as usize
    } else {
        stone_value as usize
    }
}

fn digit_to_value(digit: usize) -> i32 {
    let digit = digit as i32;
    if digit > MAX_VALUE {
        MAX_VALUE - digit
    } else {
        digit
    }
}

fn base36_digit(c: u8) -> Option<usize> {
    BASE36_DIGITS.iter().position(|&d| d == c)
}

/// Encode a move as its two-character token.
pub fn encode_move(field_index: FieldIndex, stone_value: i32) -> Result<String, CodecError> {
    Move::new(field_index, stone_value)
        .map(|m| m.token())
        .ok_or(CodecError::OutOfRange {
            field_index,
            stone_value,
        })
}

/// Decode a two-character token.
pub fn decode_move_token(token: &str) -> Result<Move, CodecError> {
    decode_token_bytes(token.as_bytes())
}

pub(crate) fn decode_token_bytes(token: &[u8]) -> Result<Move, CodecError> {
    let invalid = || CodecError::InvalidToken(String::from_utf8_lossy(token).into_owned());
    let [field, value] = token else {
        return Err(invalid());
    };
    let field_index = base36_digit(*field).filter(|&i| i < FIELDS).ok_or_else(invalid)?;
    let digit = base36_digit(*value)
        .filter(|&d| d <= 2 * MAX_VALUE as usize)
        .ok_or_else(invalid)?;
    Ok(Move {
        field_index,
        stone_value: digit_to_value(digit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_examples() {
        assert_eq!(encode_move(0, 5).unwrap(), "05");
        assert_eq!(encode_move(0, 0).unwrap(), "00");
        assert_eq!(encode_move(35, 15).unwrap(), "zf");
        assert_eq!(encode_move(10, -1).unwrap(), "ag");
        assert_eq!(encode_move(10, -15).unwrap(), "au");
    }

    #[test]
    fn test_encode_out_of_range() {
        assert!(matches!(
            encode_move(36, 1),
            Err(CodecError::OutOfRange { field_index: 36, .. })
        ));
        assert!(encode_move(0, 16).is_err());
        assert!(encode_move(0, -16).is_err());
    }

    #[test]
    fn test_decode_examples() {
        let m = decode_move_token("05").unwrap();
        assert_eq!((m.field_index(), m.stone_value()), (0, 5));

        let m = decode_move_token("ag").unwrap();
        assert_eq!((m.field_index(), m.stone_value()), (10, -1));
        assert_eq!(m.player(), Player::Blue);

        let m = decode_move_token("zu").unwrap();
        assert_eq!((m.field_index(), m.stone_value()), (35, -15));
    }

    #[test]
    fn test_every_value_survives_the_codec() {
        for value in -MAX_VALUE..=MAX_VALUE {
            let token = encode_move(7, value).unwrap();
            assert_eq!(decode_move_token(&token).unwrap().stone_value(), value);
        }
    }

    #[test]
    fn test_decode_rejects_bad_tokens() {
        for token in ["", "0", "000", "0v", "0z", "A0", "0A", "-1", "0 ", "é"] {
            assert!(
                matches!(decode_move_token(token), Err(CodecError::InvalidToken(_))),
                "token {:?} should be rejected",
                token
            );
        }
    }

    #[test]
    fn test_move_display() {
        let m = Move::new(crate::coords::coords_to_index(2, 3), -7).unwrap();
        assert_eq!(m.to_string(), "C4=7");
    }
}
