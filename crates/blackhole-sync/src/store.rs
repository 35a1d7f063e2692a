//! The remote state store, as seen by the client.
//!
//! The store holds one encoded state string per game and versions it with
//! an ETag. The client relies on three conditional operations:
//! - `fetch` with `If-None-Match`: long-poll for a change
//! - `replace` with `If-Match`: compare-and-swap a new state
//! - `create`: start a new game
//!
//! Implementations: [`HttpStore`](crate::http::HttpStore) for a real
//! server, [`MemoryStore`](crate::memory::MemoryStore) in-process.

use crate::protocol::{ETag, StateId};
use async_trait::async_trait;
use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request could not be completed.
    #[error("request failed: {0}")]
    Request(String),

    /// The store answered with a status the protocol does not allow here.
    #[error("unexpected status code {0}")]
    UnexpectedStatus(u16),

    /// No state with this id.
    #[error("state {0} not found")]
    NotFound(StateId),

    /// A create request returned no id.
    #[error("store returned no state id")]
    MissingStateId,

    /// No response within the client-side timeout.
    #[error("request timed out")]
    Timeout,
}

/// Response to a (conditional) GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResponse {
    /// 304: the state still has the ETag we sent.
    NotModified,
    /// 200: current body and its ETag, if the store sent one.
    Modified { body: String, etag: Option<ETag> },
}

/// Response to a conditional PUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceResponse {
    /// 200: the write was applied.
    Accepted,
    /// 412: the state changed since the ETag we sent.
    PreconditionFailed,
}

/// Remote storage for encoded game states.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// GET the state, optionally conditional on it differing from `if_none_match`.
    ///
    /// A conditional fetch may be held open by the store until the state
    /// changes.
    async fn fetch(
        &self,
        id: &StateId,
        if_none_match: Option<&ETag>,
    ) -> Result<FetchResponse, StoreError>;

    /// PUT a new encoded state if the current ETag is still `if_match`.
    async fn replace(
        &self,
        id: &StateId,
        body: &str,
        if_match: &ETag,
    ) -> Result<ReplaceResponse, StoreError>;

    /// POST a new game with the given initial state; returns its id.
    async fn create(&self, body: &str) -> Result<StateId, StoreError>;
}
