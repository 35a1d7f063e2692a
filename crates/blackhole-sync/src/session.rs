//! Game session: one client's synchronized view of a shared game.
//!
//! The session keeps the last state it fetched together with its ETag and
//! publishes both as one [`Snapshot`] on a watch channel. Changes arrive
//! by long-polling the store; local moves are written back with a
//! conditional replace and only show up once the poll delivers them.
//!
//! ```text
//! Uninitialized -> Loading -> Synced <-> Polling -> Failed
//!                                  \-> Closed (shutdown)
//! ```

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::protocol::{ETag, StateId};
use crate::store::{FetchResponse, ReplaceResponse, StateStore, StoreError};
use blackhole_core::{Coords, GameState};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Where a session is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    /// Initial fetch in progress
    Loading,
    /// Holding a state, no request outstanding
    Synced,
    /// Long-poll outstanding
    Polling,
    /// A fatal error ended the session's activity
    Failed(String),
    /// Shut down by the owner
    Closed,
}

/// A state together with the ETag it was fetched under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub state: GameState,
    pub etag: ETag,
}

/// Result of submitting a local move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The store took the new state; it arrives through polling.
    Accepted,
    /// Someone else moved first. The move was discarded.
    Conflict,
    /// Not a legal move in the current state. Nothing was sent.
    InvalidMove,
    /// Another submission is still in flight.
    Busy,
}

/// A client session for one game.
///
/// Dropping the session stops its polling task.
pub struct GameSession<S: StateStore + 'static> {
    inner: Arc<SessionInner<S>>,
}

struct SessionInner<S> {
    store: Arc<S>,
    id: StateId,
    config: SyncConfig,
    snapshot: watch::Sender<Option<Snapshot>>,
    phase: watch::Sender<SessionPhase>,
    shutdown: watch::Sender<bool>,
    polling: Mutex<()>,
    submitting: Mutex<()>,
}

impl<S: StateStore + 'static> GameSession<S> {
    /// Create a session for the game `id`. Nothing is fetched until
    /// [`initialize`](Self::initialize).
    pub fn new(store: Arc<S>, id: StateId, config: SyncConfig) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                store,
                id,
                config,
                snapshot: watch::channel(None).0,
                phase: watch::channel(SessionPhase::Uninitialized).0,
                shutdown: watch::channel(false).0,
                polling: Mutex::new(()),
                submitting: Mutex::new(()),
            }),
        }
    }

    pub fn id(&self) -> &StateId {
        &self.inner.id
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.phase.borrow().clone()
    }

    /// Latest state and ETag, if any
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.inner.snapshot.borrow().clone()
    }

    pub fn state(&self) -> Option<GameState> {
        self.inner.snapshot.borrow().as_ref().map(|s| s.state.clone())
    }

    /// Observe snapshot replacements
    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot>> {
        self.inner.snapshot.subscribe()
    }

    /// Observe phase changes
    pub fn subscribe_phase(&self) -> watch::Receiver<SessionPhase> {
        self.inner.phase.subscribe()
    }

    /// Fetch the current state without conditions and cache it.
    ///
    /// Any failure is final: no retry, nothing cached.
    pub async fn initialize(&self) -> Result<Snapshot, SyncError> {
        let inner = &self.inner;
        if inner.is_shut_down() {
            return Err(SyncError::Closed);
        }
        inner.phase.send_replace(SessionPhase::Loading);

        match inner.load().await {
            Ok(snapshot) => {
                info!(
                    id = %inner.id,
                    moves = snapshot.state.move_count(),
                    status = %snapshot.state.status(),
                    "session initialized"
                );
                inner.snapshot.send_replace(Some(snapshot.clone()));
                inner.phase.send_replace(SessionPhase::Synced);
                Ok(snapshot)
            }
            Err(e) => {
                error!(id = %inner.id, "initialization failed: {}", e);
                inner.phase.send_replace(SessionPhase::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Run the long-poll loop on its own task.
    pub fn spawn_polling(&self) -> JoinHandle<Result<(), SyncError>> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run_polling().await })
    }

    /// Run the long-poll loop until shutdown or a fatal error.
    pub async fn run_polling(&self) -> Result<(), SyncError> {
        self.inner.run_polling().await
    }

    /// Play a stone on `coords` and write the result back to the store.
    ///
    /// `piece_value` is signed: positive for red, negative for blue, 0 for
    /// a neutral marker.
    pub async fn submit_move(
        &self,
        coords: Coords,
        piece_value: i32,
    ) -> Result<SubmitOutcome, SyncError> {
        let inner = &self.inner;
        let Ok(_guard) = inner.submitting.try_lock() else {
            debug!(field = %coords, value = piece_value, "submission already in flight");
            return Ok(SubmitOutcome::Busy);
        };
        if inner.is_shut_down() {
            return Err(SyncError::Closed);
        }
        let current = inner
            .snapshot
            .borrow()
            .clone()
            .ok_or(SyncError::NotInitialized)?;

        let Some(next) = current.state.do_move(coords.u(), coords.v(), piece_value) else {
            debug!(field = %coords, value = piece_value, "invalid move");
            return Ok(SubmitOutcome::InvalidMove);
        };

        let body = next.encode();
        let response = inner
            .with_timeout(inner.store.replace(&inner.id, &body, &current.etag))
            .await?;
        match response {
            ReplaceResponse::Accepted => {
                info!(id = %inner.id, field = %coords, value = piece_value, "move accepted");
                Ok(SubmitOutcome::Accepted)
            }
            ReplaceResponse::PreconditionFailed => {
                info!(id = %inner.id, "game state has changed, move discarded");
                Ok(SubmitOutcome::Conflict)
            }
        }
    }

    /// Stop polling and refuse further work.
    pub fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
        self.inner.phase.send_replace(SessionPhase::Closed);
        debug!(id = %self.inner.id, "session closed");
    }
}

impl<S: StateStore + 'static> Drop for GameSession<S> {
    fn drop(&mut self) {
        self.inner.shutdown.send_replace(true);
    }
}

impl<S: StateStore> SessionInner<S> {
    fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Apply the configured client-side timeout to a store request
    async fn with_timeout<T>(
        &self,
        request: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match self.config.poll_timeout() {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| StoreError::Timeout)?,
            None => request.await,
        }
    }

    fn decode(body: &str) -> Result<GameState, SyncError> {
        GameState::decode(body).map_err(|e| SyncError::invalid_state(body, e))
    }

    async fn load(&self) -> Result<Snapshot, SyncError> {
        match self.with_timeout(self.store.fetch(&self.id, None)).await? {
            FetchResponse::Modified { body, etag } => {
                let state = Self::decode(&body)?;
                let etag = etag.ok_or_else(|| {
                    SyncError::ProtocolViolation("missing ETag in response".to_string())
                })?;
                Ok(Snapshot { state, etag })
            }
            // Only a conditional request may be answered with 304
            FetchResponse::NotModified => Err(StoreError::UnexpectedStatus(304).into()),
        }
    }

    async fn run_polling(&self) -> Result<(), SyncError> {
        let Ok(_guard) = self.polling.try_lock() else {
            return Err(SyncError::AlreadyPolling);
        };
        let result = self.poll_loop().await;
        match &result {
            Ok(()) => {
                debug!(id = %self.id, "polling stopped");
                self.phase.send_replace(SessionPhase::Closed);
            }
            Err(e) => {
                error!(id = %self.id, "polling failed: {}", e);
                self.phase.send_replace(SessionPhase::Failed(e.to_string()));
            }
        }
        result
    }

    /// Returns `Ok` only on shutdown.
    async fn poll_loop(&self) -> Result<(), SyncError> {
        let mut shutdown = self.shutdown.subscribe();
        let mut timeouts = 0;

        loop {
            if *shutdown.borrow_and_update() {
                return Ok(());
            }
            let known = self
                .snapshot
                .borrow()
                .as_ref()
                .map(|s| s.etag.clone())
                .ok_or(SyncError::NotInitialized)?;

            self.phase.send_replace(SessionPhase::Polling);
            debug!(id = %self.id, etag = %known, "polling");
            let response = tokio::select! {
                _ = shutdown.changed() => return Ok(()),
                response = self.with_timeout(self.store.fetch(&self.id, Some(&known))) => response,
            };

            let delay = match response {
                Ok(FetchResponse::NotModified) => {
                    timeouts = 0;
                    debug!(id = %self.id, "not modified");
                    continue;
                }
                Ok(FetchResponse::Modified { body, etag }) => {
                    timeouts = 0;
                    let state = Self::decode(&body)?;
                    let etag = etag.ok_or_else(|| {
                        SyncError::ProtocolViolation(
                            "missing ETag in poll response, polling disabled".to_string(),
                        )
                    })?;

                    let unchanged = etag == known;
                    if unchanged {
                        warn!(
                            id = %self.id,
                            etag = %etag,
                            "poll returned the ETag we sent; is the server ignoring If-None-Match?"
                        );
                    } else {
                        info!(
                            id = %self.id,
                            moves = state.move_count(),
                            status = %state.status(),
                            "state changed"
                        );
                    }
                    self.snapshot.send_replace(Some(Snapshot { state, etag }));
                    self.phase.send_replace(SessionPhase::Synced);

                    if unchanged {
                        self.config.unchanged_etag_backoff()
                    } else {
                        self.config.poll_delay()
                    }
                }
                Err(StoreError::Timeout) => {
                    timeouts += 1;
                    if timeouts >= self.config.max_poll_timeouts {
                        return Err(StoreError::Timeout.into());
                    }
                    warn!(id = %self.id, attempt = timeouts, "poll timed out, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            tokio::select! {
                _ = shutdown.changed() => return Ok(()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

/// Validate `initial` and store it as a new game.
pub async fn create_game<S: StateStore + ?Sized>(
    store: &S,
    initial: &str,
) -> Result<StateId, SyncError> {
    let state = GameState::decode(initial).map_err(|e| SyncError::invalid_state(initial, e))?;
    let id = store.create(&state.encode()).await?;
    info!(id = %id, moves = state.move_count(), "created game");
    Ok(id)
}
