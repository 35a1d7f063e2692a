//! WebAssembly bindings for the Black Hole engine.
//!
//! This module exposes the engine to a JavaScript renderer through
//! wasm-bindgen. States cross the boundary as encoded strings, so the
//! browser never holds anything the decoder has not checked.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::game::GameState;

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed game wrapper
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct WasmGame {
    state: GameState,
}

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl WasmGame {
    /// Decode a game from its encoded state string
    #[wasm_bindgen(constructor)]
    pub fn new(encoded: &str) -> Result<WasmGame, JsValue> {
        GameState::decode(encoded)
            .map(|state| WasmGame { state })
            .map_err(|e| JsValue::from_str(&format!("Invalid state string: {}", e)))
    }

    /// Start from a random placement of the neutral markers
    #[wasm_bindgen(js_name = randomSetup)]
    pub fn random_setup() -> WasmGame {
        WasmGame {
            state: crate::setup::random_setup(&mut rand::thread_rng()),
        }
    }

    /// Get the current game state as JSON (for rendering)
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(&self.state.to_view()).unwrap_or_else(|_| "{}".to_string())
    }

    /// The encoded state string
    pub fn encode(&self) -> String {
        self.state.encode()
    }

    /// Try a move; returns false and leaves the state unchanged if illegal
    #[wasm_bindgen(js_name = doMove)]
    pub fn do_move(&mut self, u: i32, v: i32, piece_value: i32) -> bool {
        match self.state.do_move(u, v, piece_value) {
            Some(next) => {
                self.state = next;
                true
            }
            None => false,
        }
    }

    /// Whether a stone can be picked from the tray
    #[wasm_bindgen(js_name = isSelectable)]
    pub fn is_selectable(&self, value: i32) -> bool {
        self.state.selectable(value)
    }

    /// Sign of the player to move (0 during setup), or undefined when finished
    #[wasm_bindgen(js_name = getNextPlayer)]
    pub fn get_next_player(&self) -> Option<i32> {
        self.state.next_player().map(|p| p.sign())
    }

    /// Status line, e.g. "Red to move."
    #[wasm_bindgen(js_name = getStatus)]
    pub fn get_status(&self) -> String {
        self.state.status().to_string()
    }

    /// Final score (if game is finished)
    #[wasm_bindgen(js_name = getScore)]
    pub fn get_score(&self) -> Option<i32> {
        self.state.score()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapper_moves() {
        let mut game = WasmGame::new("").unwrap();
        assert!(game.do_move(0, 0, 0));
        assert!(!game.do_move(0, 0, 0));
        assert_eq!(game.encode(), "00");
        assert_eq!(game.get_next_player(), Some(0));
    }
}
