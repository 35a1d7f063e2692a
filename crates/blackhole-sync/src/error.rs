//! Error types for the sync client.

use crate::store::StoreError;
use blackhole_core::StateError;
use thiserror::Error;

/// Errors that end a session operation.
///
/// Every variant is terminal for the operation that returned it; polling
/// does not resume on its own.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Request failed or the store answered with an unexpected status.
    #[error("transport error: {0}")]
    Transport(#[from] StoreError),

    /// The store holds a state string that does not decode.
    #[error("invalid remote state {body:?}: {source}")]
    InvalidState {
        body: String,
        #[source]
        source: StateError,
    },

    /// The store broke the conditional-request contract.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// No state has been loaded yet.
    #[error("session not initialized")]
    NotInitialized,

    /// Another task is already polling this session.
    #[error("session is already polling")]
    AlreadyPolling,

    /// The session was shut down.
    #[error("session closed")]
    Closed,
}

impl SyncError {
    pub(crate) fn invalid_state(body: &str, source: StateError) -> Self {
        SyncError::InvalidState {
            body: body.to_string(),
            source,
        }
    }
}
