//! Coordinate system for the triangular board.
//!
//! Fields are addressed two ways:
//! - `Coords`: axial coordinates `(u, v)` with `u + v < SIZE`
//! - `FieldIndex`: a linear index numbering the fields row by row
//!
//! Axial coordinates make adjacency a fixed set of offsets, the same trick
//! used for hex grids. The linear index is what the move codec writes.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of fields along each side of the board
pub const SIZE: i32 = 8;

/// Total number of fields on the board (36 for `SIZE = 8`)
pub const FIELDS: usize = (SIZE * (SIZE + 1) / 2) as usize;

/// Linear index of a field, in `0..FIELDS`
pub type FieldIndex = usize;

/// Axial offsets of the six neighbours of a field
const NEIGHBOR_OFFSETS: [(i32, i32); 6] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
];

/// Whether `(u, v)` lies on the board.
pub fn valid_coords(u: i32, v: i32) -> bool {
    0 <= u && u < SIZE && 0 <= v && u + v < SIZE
}

/// Linear index of the field at `(u, v)`.
///
/// The result is only meaningful for valid coordinates; check with
/// [`valid_coords`] first.
pub fn coords_to_index(u: i32, v: i32) -> FieldIndex {
    (SIZE * u - u * (u - 1) / 2 + v) as FieldIndex
}

/// Coordinates of the field with the given index, or `None` if out of range.
pub fn index_to_coords(index: FieldIndex) -> Option<Coords> {
    if index >= FIELDS {
        return None;
    }
    let (mut u, mut v, mut row) = (0, index as i32, SIZE);
    while v >= row {
        v -= row;
        u += 1;
        row -= 1;
    }
    Some(Coords { u, v })
}

/// A valid position on the board.
///
/// Can only be constructed for on-board coordinates, so every `Coords`
/// value maps to a field index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Coords {
    u: i32,
    v: i32,
}

impl Coords {
    /// Create coordinates, or `None` if `(u, v)` is off the board
    pub fn new(u: i32, v: i32) -> Option<Self> {
        valid_coords(u, v).then_some(Self { u, v })
    }

    /// Row (0 at the top corner)
    pub const fn u(&self) -> i32 {
        self.u
    }

    /// Position within the row
    pub const fn v(&self) -> i32 {
        self.v
    }

    /// Linear field index
    pub fn index(&self) -> FieldIndex {
        coords_to_index(self.u, self.v)
    }

    /// All fields in index order
    pub fn all() -> impl Iterator<Item = Coords> {
        (0..SIZE).flat_map(|u| (0..SIZE - u).map(move |v| Coords { u, v }))
    }

    /// The on-board neighbours of this field.
    ///
    /// Interior fields have six; edge fields four; the three corners two.
    pub fn neighbors(&self) -> impl Iterator<Item = Coords> {
        let Coords { u, v } = *self;
        NEIGHBOR_OFFSETS
            .into_iter()
            .filter_map(move |(du, dv)| Coords::new(u + du, v + dv))
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row = char::from(b'A' + self.u as u8);
        write!(f, "{}{}", row, self.v + 1)
    }
}

/// Error parsing a field name such as `C4`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid field name {0:?}")]
pub struct ParseCoordsError(String);

impl FromStr for Coords {
    type Err = ParseCoordsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCoordsError(s.to_string());
        let mut chars = s.trim().chars();
        let row = chars.next().ok_or_else(err)?.to_ascii_uppercase();
        if !row.is_ascii_uppercase() {
            return Err(err());
        }
        let column: i32 = chars.as_str().parse().map_err(|_| err())?;
        let u = row as i32 - 'A' as i32;
        Coords::new(u, column - 1).ok_or_else(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_count() {
        assert_eq!(FIELDS, 36);
        assert_eq!(Coords::all().count(), FIELDS);
    }

    #[test]
    fn test_index_round_trip() {
        for u in 0..SIZE {
            for v in 0..SIZE - u {
                let index = coords_to_index(u, v);
                assert!(index < FIELDS);
                assert_eq!(index_to_coords(index), Coords::new(u, v));
            }
        }
        assert_eq!(index_to_coords(FIELDS), None);
    }

    #[test]
    fn test_all_is_in_index_order() {
        let indices: Vec<_> = Coords::all().map(|c| c.index()).collect();
        assert_eq!(indices, (0..FIELDS).collect::<Vec<_>>());
    }

    #[test]
    fn test_valid_coords() {
        assert!(valid_coords(0, 0));
        assert!(valid_coords(7, 0));
        assert!(valid_coords(0, 7));
        assert!(!valid_coords(1, 7));
        assert!(!valid_coords(-1, 0));
        assert!(!valid_coords(0, -1));
        assert!(!valid_coords(8, 0));
    }

    #[test]
    fn test_corner_indices() {
        assert_eq!(coords_to_index(0, 0), 0);
        assert_eq!(coords_to_index(0, 7), 7);
        assert_eq!(coords_to_index(1, 0), 8);
        assert_eq!(coords_to_index(7, 0), 35);
    }

    #[test]
    fn test_neighbor_counts() {
        let count = |u, v| Coords::new(u, v).unwrap().neighbors().count();
        // Corners
        assert_eq!(count(0, 0), 2);
        assert_eq!(count(0, 7), 2);
        assert_eq!(count(7, 0), 2);
        // Edge
        assert_eq!(count(0, 3), 4);
        assert_eq!(count(3, 0), 4);
        assert_eq!(count(3, 4), 4);
        // Interior
        assert_eq!(count(2, 2), 6);
    }

    #[test]
    fn test_neighbors_are_symmetric() {
        for field in Coords::all() {
            for neighbor in field.neighbors() {
                let back: HashSet<_> = neighbor.neighbors().collect();
                assert!(back.contains(&field), "{} <-> {}", field, neighbor);
            }
        }
    }

    #[test]
    fn test_field_names() {
        assert_eq!(Coords::new(0, 0).unwrap().to_string(), "A1");
        assert_eq!(Coords::new(2, 3).unwrap().to_string(), "C4");
        assert_eq!(Coords::new(7, 0).unwrap().to_string(), "H1");

        assert_eq!("C4".parse::<Coords>(), Ok(Coords::new(2, 3).unwrap()));
        assert_eq!("h1".parse::<Coords>(), Ok(Coords::new(7, 0).unwrap()));
        assert!("H2".parse::<Coords>().is_err());
        assert!("A0".parse::<Coords>().is_err());
        assert!("".parse::<Coords>().is_err());
        assert!("4C".parse::<Coords>().is_err());
    }
}
