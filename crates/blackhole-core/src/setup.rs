//! Random opening positions.
//!
//! A game starts with neutral markers on `INITIAL_STONES` distinct fields.
//! Players who do not want to place them by hand can start from a random
//! setup instead.

use crate::codec::Move;
use crate::coords::FIELDS;
use crate::game::GameState;
use crate::rules::INITIAL_STONES;
use rand::seq::index::sample;
use rand::Rng;

/// A state with the neutral markers placed on random distinct fields.
pub fn random_setup<R: Rng + ?Sized>(rng: &mut R) -> GameState {
    let encoded: String = sample(rng, FIELDS, INITIAL_STONES)
        .into_iter()
        .filter_map(|field_index| Move::new(field_index, 0))
        .map(|m| m.token())
        .collect();
    GameState::decode(&encoded).expect("distinct neutral markers form a valid setup")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Player;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_setup_places_neutral_markers() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let state = random_setup(&mut rng);
            assert_eq!(state.move_count(), INITIAL_STONES);
            assert_eq!(state.next_player(), Some(Player::Red));
            assert!(state.history().iter().all(|m| m.stone_value() == 0));
            assert_eq!(state.empty_fields().count(), FIELDS - INITIAL_STONES);
        }
    }

    #[test]
    fn test_random_setup_is_seeded() {
        let a = random_setup(&mut StdRng::seed_from_u64(42));
        let b = random_setup(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
