//! Black Hole - a two-player stone placement game on a triangular board.
//!
//! This crate provides the game engine:
//! - Coordinates and field indices for the 36-field board
//! - The two-character move codec
//! - `GameState`, which can only be obtained by replaying and validating
//!   a complete move history
//! - Turn order and scoring
//!
//! # Architecture
//!
//! The engine is pure and platform-agnostic. It can be compiled to:
//! - Native Rust for the sync client and command line tool
//! - WebAssembly for a browser renderer (`wasm` feature)
//!
//! # Modules
//!
//! - [`coords`]: Board coordinates and adjacency
//! - [`codec`]: Move tokens
//! - [`game`]: Validated game state and the state codec
//! - [`rules`]: Turn order, influence and final score
//! - [`setup`]: Random opening positions

pub mod codec;
pub mod coords;
pub mod game;
pub mod rules;
pub mod setup;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use codec::{decode_move_token, encode_move, CodecError, Move, BASE36_DIGITS, MAX_VALUE};
pub use coords::{
    coords_to_index, index_to_coords, valid_coords, Coords, FieldIndex, ParseCoordsError, FIELDS,
    SIZE,
};
pub use game::{GameState, StateError, StateView};
pub use rules::{
    calculate_score, field_influence, move_index_to_player, Influence, Outcome, Player, Status,
    INITIAL_STONES, MAX_MOVES,
};
pub use setup::random_setup;
