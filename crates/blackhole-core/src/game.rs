//! Game state and the validating state codec.
//!
//! A game is fully described by its move history. The encoded form is the
//! concatenation of the move tokens, and decoding replays every token
//! through the rules. Decoding is the only way to obtain a `GameState`, so
//! every state in memory is known to be legal no matter where its string
//! came from.

use crate::codec::{self, CodecError, Move, MAX_VALUE, TOKEN_LEN};
use crate::coords::{coords_to_index, valid_coords, Coords, FieldIndex, FIELDS};
use crate::rules::{self, Influence, Player, Status, MAX_MOVES};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Slots for stone availability, indexed by the codec's value digit
const STONE_SLOTS: usize = 2 * MAX_VALUE as usize + 1;

/// Why an encoded state was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("encoded state has odd length {0}")]
    OddLength(usize),

    #[error("move {index}: {source}")]
    InvalidToken {
        index: usize,
        #[source]
        source: CodecError,
    },

    #[error("move {index}: game is already over")]
    TooManyMoves { index: usize },

    #[error("move {index}: field {field} is already occupied")]
    FieldOccupied { index: usize, field: FieldIndex },

    #[error("move {index}: stone {value} cannot be placed by {expected:?}")]
    WrongPlayer {
        index: usize,
        value: i32,
        expected: Player,
    },

    #[error("move {index}: stone {value} was already used")]
    StoneUsed { index: usize, value: i32 },
}

/// A validated game state.
///
/// Immutable: moves produce a new state via [`GameState::do_move`].
/// Serializes as its encoded string, and deserializing revalidates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct GameState {
    history: Vec<Move>,
    fields: [Option<i32>; FIELDS],
    used: [bool; STONE_SLOTS],
    last_move: Option<FieldIndex>,
}

impl GameState {
    /// The empty game: no moves, neutral markers to place
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            fields: [None; FIELDS],
            used: [false; STONE_SLOTS],
            last_move: None,
        }
    }

    /// Decode and fully validate an encoded state.
    pub fn decode(encoded: &str) -> Result<Self, StateError> {
        let bytes = encoded.as_bytes();
        if bytes.len() % TOKEN_LEN != 0 {
            return Err(StateError::OddLength(bytes.len()));
        }

        let mut state = Self::new();
        for (index, token) in bytes.chunks_exact(TOKEN_LEN).enumerate() {
            let m = codec::decode_token_bytes(token)
                .map_err(|source| StateError::InvalidToken { index, source })?;
            state.replay(index, m)?;
        }
        Ok(state)
    }

    /// Apply move `index` of a history being decoded
    fn replay(&mut self, index: usize, m: Move) -> Result<(), StateError> {
        let expected = rules::move_index_to_player(index).ok_or(StateError::TooManyMoves { index })?;
        let field_index = m.field_index();
        let value = m.stone_value();

        if self.fields[field_index].is_some() {
            return Err(StateError::FieldOccupied {
                index,
                field: field_index,
            });
        }
        if m.player() != expected {
            return Err(StateError::WrongPlayer {
                index,
                value,
                expected,
            });
        }
        let slot = codec::value_to_digit(value);
        if value != 0 && self.used[slot] {
            return Err(StateError::StoneUsed { index, value });
        }

        self.fields[field_index] = Some(value);
        self.history.push(m);
        if value != 0 {
            self.used[slot] = true;
            self.last_move = Some(field_index);
        }
        Ok(())
    }

    /// The canonical encoded form of this state
    pub fn encode(&self) -> String {
        self.history.iter().map(Move::token).collect()
    }

    /// Place `piece_value` on `(u, v)`.
    ///
    /// Returns the new state, or `None` if the move is illegal. The move is
    /// validated by decoding the extended history, so it obeys exactly the
    /// same rules as a state received from elsewhere.
    pub fn do_move(&self, u: i32, v: i32, piece_value: i32) -> Option<GameState> {
        if !valid_coords(u, v) || !(-MAX_VALUE..=MAX_VALUE).contains(&piece_value) {
            return None;
        }
        let token = codec::encode_move(coords_to_index(u, v), piece_value).ok()?;
        let mut encoded = self.encode();
        encoded.push_str(&token);
        GameState::decode(&encoded).ok()
    }

    /// All moves played so far, in order
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn move_count(&self) -> usize {
        self.history.len()
    }

    /// Contents of every field: `None` if empty, else the placed value
    pub fn fields(&self) -> &[Option<i32>; FIELDS] {
        &self.fields
    }

    /// Contents of one field; `None` if empty or out of range
    pub fn field(&self, index: FieldIndex) -> Option<i32> {
        self.fields.get(index).copied().flatten()
    }

    /// Empty fields in index order
    pub fn empty_fields(&self) -> impl Iterator<Item = Coords> + '_ {
        Coords::all().filter(|c| self.fields[c.index()].is_none())
    }

    /// Whether the signed stone `value` is still in its owner's hand.
    ///
    /// Neutral markers (0) are not stones and are never available.
    pub fn is_stone_available(&self, value: i32) -> bool {
        value != 0 && (-MAX_VALUE..=MAX_VALUE).contains(&value) && !self.used[codec::value_to_digit(value)]
    }

    /// Stones the given player has not placed yet, in increasing magnitude
    pub fn available_stones(&self, player: Player) -> Vec<i32> {
        (1..=MAX_VALUE)
            .map(|magnitude| magnitude * player.sign())
            .filter(|&value| self.is_stone_available(value))
            .collect()
    }

    /// Whether `value` may be picked from the tray for the next move
    pub fn selectable(&self, value: i32) -> bool {
        self.next_player().map(|p| p.sign()) == Some(value.signum()) && self.is_stone_available(value)
    }

    /// Who moves next, or `None` once all stones are placed
    pub fn next_player(&self) -> Option<Player> {
        rules::move_index_to_player(self.history.len())
    }

    /// Field of the most recent red or blue stone
    pub fn last_move(&self) -> Option<FieldIndex> {
        self.last_move
    }

    pub fn is_finished(&self) -> bool {
        self.history.len() >= MAX_MOVES
    }

    pub fn status(&self) -> Status {
        Status::of(self)
    }

    /// Final score; `None` until the game is finished
    pub fn score(&self) -> Option<i32> {
        rules::calculate_score(self)
    }

    /// JSON-friendly projection for renderers
    pub fn to_view(&self) -> StateView {
        StateView {
            encoded: self.encode(),
            fields: self.fields.to_vec(),
            history: self.history.clone(),
            next_player: self.next_player(),
            last_move: self.last_move,
            red_stones: self.available_stones(Player::Red),
            blue_stones: self.available_stones(Player::Blue),
            influence: Coords::all()
                .map(|c| {
                    self.fields[c.index()]
                        .is_none()
                        .then(|| rules::field_influence(self, c))
                })
                .collect(),
            status: self.status().to_string(),
            score: self.score(),
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.history {
            f.write_str(&m.token())?;
        }
        Ok(())
    }
}

impl FromStr for GameState {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl TryFrom<String> for GameState {
    type Error = StateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::decode(&s)
    }
}

impl From<GameState> for String {
    fn from(state: GameState) -> Self {
        state.encode()
    }
}

/// Read-only view of a state for rendering, with derived per-field data
#[derive(Debug, Clone, Serialize)]
pub struct StateView {
    pub encoded: String,
    pub fields: Vec<Option<i32>>,
    pub history: Vec<Move>,
    pub next_player: Option<Player>,
    pub last_move: Option<FieldIndex>,
    pub red_stones: Vec<i32>,
    pub blue_stones: Vec<i32>,
    /// Influence on each empty field; `None` for occupied fields
    pub influence: Vec<Option<Influence>>,
    pub status: String,
    pub score: Option<i32>,
}
