//! Turn order and scoring.
//!
//! Turn order depends only on how many moves have been played: five neutral
//! markers first, then red and blue alternate until each has placed all of
//! their stones. Exactly one field is left empty at that point.

use crate::codec::MAX_VALUE;
use crate::coords::Coords;
use crate::game::GameState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of neutral markers placed before red's first move
pub const INITIAL_STONES: usize = 5;

/// Length of a finished game's history
pub const MAX_MOVES: usize = INITIAL_STONES + 2 * MAX_VALUE as usize;

/// Who places the next stone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    /// Places the black-hole markers during setup
    Neutral,
    /// First player, positive stone values
    Red,
    /// Second player, negative stone values
    Blue,
}

impl Player {
    /// The player owning a stone with the given signed value
    pub fn of_value(stone_value: i32) -> Self {
        match stone_value.signum() {
            1 => Player::Red,
            -1 => Player::Blue,
            _ => Player::Neutral,
        }
    }

    /// Sign of this player's stone values: +1, -1, or 0
    pub const fn sign(&self) -> i32 {
        match self {
            Player::Neutral => 0,
            Player::Red => 1,
            Player::Blue => -1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Player::Neutral => "Neutral",
            Player::Red => "Red",
            Player::Blue => "Blue",
        }
    }
}

/// The player expected to make move `index` (0-based), or `None` once the
/// game is over.
pub fn move_index_to_player(index: usize) -> Option<Player> {
    if index < INITIAL_STONES {
        Some(Player::Neutral)
    } else if index >= MAX_MOVES {
        None
    } else if (index - INITIAL_STONES) % 2 == 0 {
        Some(Player::Red)
    } else {
        Some(Player::Blue)
    }
}

/// Red and blue stone totals adjacent to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Influence {
    pub red: i32,
    pub blue: i32,
}

impl Influence {
    /// Net influence: positive favours red
    pub const fn delta(&self) -> i32 {
        self.red - self.blue
    }
}

/// Sum the stones next to a field, split by owner.
///
/// This is what an empty field would score if the game ended now.
pub fn field_influence(state: &GameState, coords: Coords) -> Influence {
    let mut influence = Influence::default();
    for neighbor in coords.neighbors() {
        match state.field(neighbor.index()) {
            Some(value) if value > 0 => influence.red += value,
            Some(value) if value < 0 => influence.blue -= value,
            _ => {}
        }
    }
    influence
}

/// Final score of a finished game, or `None` while the game is in progress.
///
/// Every stone touching an empty field counts toward its owner; red counts
/// positive and blue negative.
pub fn calculate_score(state: &GameState) -> Option<i32> {
    if !state.is_finished() {
        return None;
    }
    Some(
        state
            .empty_fields()
            .map(|coords| field_influence(state, coords).delta())
            .sum(),
    )
}

/// Result of a finished game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    RedWins,
    BlueWins,
    Tie,
}

impl Outcome {
    pub fn from_score(score: i32) -> Self {
        match score.signum() {
            1 => Outcome::RedWins,
            -1 => Outcome::BlueWins,
            _ => Outcome::Tie,
        }
    }

    pub fn winner(&self) -> Option<Player> {
        match self {
            Outcome::RedWins => Some(Player::Red),
            Outcome::BlueWins => Some(Player::Blue),
            Outcome::Tie => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::RedWins => f.write_str("Red wins!"),
            Outcome::BlueWins => f.write_str("Blue wins!"),
            Outcome::Tie => f.write_str("It's a tie!"),
        }
    }
}

/// One-line summary of where a game stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Neutral markers still being placed
    Setup,
    /// Waiting for red or blue
    ToMove(Player),
    /// All stones placed
    Finished { score: i32, outcome: Outcome },
}

impl Status {
    pub fn of(state: &GameState) -> Self {
        match state.next_player() {
            Some(Player::Neutral) => Status::Setup,
            Some(player) => Status::ToMove(player),
            None => {
                let score = calculate_score(state).unwrap_or(0);
                Status::Finished {
                    score,
                    outcome: Outcome::from_score(score),
                }
            }
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Setup => f.write_str("Waiting for initial stones."),
            Status::ToMove(player) => write!(f, "{} to move.", player.name()),
            Status::Finished { score, outcome } if *score > 0 => {
                write!(f, "Result: +{}. {}", score, outcome)
            }
            Status::Finished { score, outcome } => write!(f, "Result: {}. {}", score, outcome),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_is_neutral() {
        for i in 0..INITIAL_STONES {
            assert_eq!(move_index_to_player(i), Some(Player::Neutral));
        }
    }

    #[test]
    fn test_turns_alternate_starting_with_red() {
        let mut expected = Player::Red;
        for i in INITIAL_STONES..MAX_MOVES {
            assert_eq!(move_index_to_player(i), Some(expected), "move {}", i);
            expected = if expected == Player::Red {
                Player::Blue
            } else {
                Player::Red
            };
        }
    }

    #[test]
    fn test_no_player_after_last_move() {
        assert_eq!(MAX_MOVES, 35);
        assert_eq!(move_index_to_player(MAX_MOVES), None);
        assert_eq!(move_index_to_player(100), None);
    }

    #[test]
    fn test_player_of_value() {
        assert_eq!(Player::of_value(0), Player::Neutral);
        assert_eq!(Player::of_value(15), Player::Red);
        assert_eq!(Player::of_value(-3), Player::Blue);
        assert_eq!(Player::Blue.sign(), -1);
    }

    #[test]
    fn test_outcome_from_score() {
        assert_eq!(Outcome::from_score(4), Outcome::RedWins);
        assert_eq!(Outcome::from_score(-1), Outcome::BlueWins);
        assert_eq!(Outcome::from_score(0), Outcome::Tie);
        assert_eq!(Outcome::Tie.winner(), None);
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(Status::Setup.to_string(), "Waiting for initial stones.");
        assert_eq!(Status::ToMove(Player::Red).to_string(), "Red to move.");
        assert_eq!(Status::ToMove(Player::Blue).to_string(), "Blue to move.");
        let finished = |score| Status::Finished {
            score,
            outcome: Outcome::from_score(score),
        };
        assert_eq!(finished(12).to_string(), "Result: +12. Red wins!");
        assert_eq!(finished(-3).to_string(), "Result: -3. Blue wins!");
        assert_eq!(finished(0).to_string(), "Result: 0. It's a tie!");
    }

    #[test]
    fn test_influence_of_empty_board() {
        let state = GameState::new();
        for coords in Coords::all() {
            assert_eq!(field_influence(&state, coords), Influence::default());
        }
        assert_eq!(calculate_score(&state), None);
    }

    #[test]
    fn test_influence_counts_neighbors_only() {
        // Red 5 on B1, blue 3 on A2, red 9 far away on H1
        let state = GameState::new()
            .do_move(0, 7, 0)
            .and_then(|s| s.do_move(0, 6, 0))
            .and_then(|s| s.do_move(0, 5, 0))
            .and_then(|s| s.do_move(0, 4, 0))
            .and_then(|s| s.do_move(0, 3, 0))
            .and_then(|s| s.do_move(1, 0, 5))
            .and_then(|s| s.do_move(0, 1, -3))
            .and_then(|s| s.do_move(7, 0, 9))
            .unwrap();
        let a1 = Coords::new(0, 0).unwrap();
        assert_eq!(field_influence(&state, a1), Influence { red: 5, blue: 3 });
        assert_eq!(field_influence(&state, a1).delta(), 2);
    }
}
