//! Addressing and version tokens for the HTTP state store.
//!
//! A game lives at `<states_url>/<id>`. Players share a join link whose
//! fragment carries the id, e.g. `http://host/play.html#0123456789abcdef0123`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of one game in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateId(String);

/// Error parsing a state id or join link
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing state id in {0:?}")]
pub struct MissingStateId(pub String);

impl StateId {
    /// Extract the id from a bare id, a `#id` fragment, or a full join link.
    ///
    /// Takes what follows the last `/`, then what follows the last `#`.
    pub fn parse(input: &str) -> Result<Self, MissingStateId> {
        let trimmed = input.trim();
        let tail = trimmed.rsplit('/').next().unwrap_or(trimmed);
        let id = tail.rsplit('#').next().unwrap_or(tail);
        if id.is_empty() {
            return Err(MissingStateId(input.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for StateId {
    type Err = MissingStateId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque version token of a stored state, exactly as sent by the store
/// (quotes included).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ETag(String);

impl ETag {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// URL of one game's state resource
pub fn state_url(states_url: &str, id: &StateId) -> String {
    format!("{}/{}", states_url.trim_end_matches('/'), id)
}

/// Link a second player can open to join the game
pub fn join_link(base_url: &str, id: &StateId) -> String {
    format!("{}/play.html#{}", base_url.trim_end_matches('/'), id)
}
