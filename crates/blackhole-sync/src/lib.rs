//! Black Hole sync client.
//!
//! Two players share one game through a state store that keeps the encoded
//! move history under an ETag. Each client:
//! - fetches the state once and then long-polls for changes
//! - writes its own moves with `If-Match`, so concurrent writers cannot
//!   overwrite each other; the loser simply waits for the next poll
//!
//! # Modules
//!
//! - [`protocol`]: State ids, join links and ETags
//! - [`store`]: The store seam and its responses
//! - [`http`]: Store client over HTTP
//! - [`memory`]: In-process store with the same semantics
//! - [`session`]: Per-game session with polling and move submission
//! - [`config`]: Client settings
//! - [`error`]: Session errors

pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod protocol;
pub mod session;
pub mod store;

pub use config::{ConfigError, SyncConfig};
pub use error::SyncError;
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use protocol::{join_link, state_url, ETag, MissingStateId, StateId};
pub use session::{create_game, GameSession, SessionPhase, Snapshot, SubmitOutcome};
pub use store::{FetchResponse, ReplaceResponse, StateStore, StoreError};
