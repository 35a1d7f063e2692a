//! In-process state store.
//!
//! Implements the same conditional semantics as the HTTP state server:
//! - a conditional fetch is held until the state changes or the hold time
//!   runs out, then answered with `NotModified`
//! - a replace only succeeds if the caller's ETag is current
//! - ETags are derived from the content, so writing identical data keeps
//!   the ETag and wakes nobody
//!
//! Used by tests and for playing two sessions in one process.

use crate::protocol::{ETag, StateId};
use crate::store::{FetchResponse, ReplaceResponse, StateStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// How long a conditional fetch waits for a change before answering 304
pub const DEFAULT_HOLD: Duration = Duration::from_secs(100);

/// Current content of one stored state
#[derive(Debug, Clone)]
struct Entry {
    data: String,
    etag: ETag,
}

impl Entry {
    fn new(data: String) -> Self {
        let etag = content_etag(&data);
        Self { data, etag }
    }
}

/// Quoted 20-hex-digit content hash, as it appears in the `ETag` header
pub fn content_etag(data: &str) -> ETag {
    let digest = hex::encode(Sha256::digest(data.as_bytes()));
    ETag::new(format!("\"{}\"", &digest[..20]))
}

fn generate_state_id() -> StateId {
    let bytes: [u8; 10] = rand::random();
    StateId::parse(&hex::encode(bytes)).unwrap_or_else(|_| unreachable!("hex ids are never empty"))
}

/// In-memory state store.
pub struct MemoryStore {
    /// One watch channel per state; receivers wait for replacements
    states: DashMap<StateId, Arc<watch::Sender<Entry>>>,
    hold: Duration,
    /// When false, conditional fetches are answered like plain ones
    conditional: bool,
    /// When false, responses carry no ETag
    send_etags: bool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            states: DashMap::new(),
            hold: DEFAULT_HOLD,
            conditional: true,
            send_etags: true,
        }
    }

    /// Set how long conditional fetches are held open
    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    /// Answer every fetch immediately with the full state, like a server
    /// that does not understand `If-None-Match`.
    pub fn ignoring_conditions(mut self) -> Self {
        self.conditional = false;
        self
    }

    /// Leave the ETag out of fetch responses.
    pub fn without_etags(mut self) -> Self {
        self.send_etags = false;
        self
    }

    /// Store `data` under a fixed id, replacing anything there
    pub fn insert(&self, id: StateId, data: &str) -> ETag {
        let entry = Entry::new(data.to_string());
        let etag = entry.etag.clone();
        match self.slot(&id) {
            Some(slot) => {
                slot.send_replace(entry);
            }
            None => {
                self.states.insert(id, Arc::new(watch::channel(entry).0));
            }
        }
        etag
    }

    /// Current content and ETag of a state
    pub fn get(&self, id: &StateId) -> Option<(String, ETag)> {
        let slot = self.slot(id)?;
        let entry = slot.borrow();
        Some((entry.data.clone(), entry.etag.clone()))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Clone the slot out so no map guard is held across an await
    fn slot(&self, id: &StateId) -> Option<Arc<watch::Sender<Entry>>> {
        self.states.get(id).map(|slot| Arc::clone(&slot))
    }

    fn respond(&self, entry: &Entry) -> FetchResponse {
        FetchResponse::Modified {
            body: entry.data.clone(),
            etag: self.send_etags.then(|| entry.etag.clone()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn fetch(
        &self,
        id: &StateId,
        if_none_match: Option<&ETag>,
    ) -> Result<FetchResponse, StoreError> {
        let slot = self.slot(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let mut rx = slot.subscribe();

        let known = match if_none_match {
            Some(etag) if self.conditional => etag,
            _ => return Ok(self.respond(&rx.borrow())),
        };

        let deadline = tokio::time::Instant::now() + self.hold;
        loop {
            {
                let entry = rx.borrow_and_update();
                if entry.etag != *known {
                    return Ok(self.respond(&entry));
                }
            }
            match tokio::time::timeout_at(deadline, rx.changed()).await {
                Ok(Ok(())) => continue,
                // Hold expired, or the state was dropped while we waited
                Ok(Err(_)) | Err(_) => {
                    debug!(id = %id, "conditional fetch not modified");
                    return Ok(FetchResponse::NotModified);
                }
            }
        }
    }

    async fn replace(
        &self,
        id: &StateId,
        body: &str,
        if_match: &ETag,
    ) -> Result<ReplaceResponse, StoreError> {
        let slot = self.slot(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let mut response = ReplaceResponse::Accepted;
        slot.send_if_modified(|entry| {
            if entry.etag != *if_match {
                response = ReplaceResponse::PreconditionFailed;
                return false;
            }
            if entry.data == body {
                return false;
            }
            *entry = Entry::new(body.to_string());
            true
        });
        debug!(id = %id, ?response, "replace");
        Ok(response)
    }

    async fn create(&self, body: &str) -> Result<StateId, StoreError> {
        loop {
            let id = generate_state_id();
            if let dashmap::mapref::entry::Entry::Vacant(vacant) = self.states.entry(id.clone()) {
                vacant.insert(Arc::new(watch::channel(Entry::new(body.to_string())).0));
                debug!(id = %id, "created state");
                return Ok(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> StateId {
        StateId::parse(s).unwrap()
    }

    #[test]
    fn test_etag_format() {
        let etag = content_etag("0010203040");
        let s = etag.as_str();
        assert_eq!(s.len(), 22);
        assert!(s.starts_with('"') && s.ends_with('"'));
        assert_eq!(etag, content_etag("0010203040"));
        assert_ne!(etag, content_etag(""));
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let store = MemoryStore::new();
        let state_id = store.create("00").await.unwrap();
        assert_eq!(state_id.as_str().len(), 20);
        assert!(state_id.as_str().chars().all(|c| c.is_ascii_hexdigit()));

        let response = store.fetch(&state_id, None).await.unwrap();
        assert_eq!(
            response,
            FetchResponse::Modified {
                body: "00".into(),
                etag: Some(content_etag("00"))
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_unknown_state() {
        let store = MemoryStore::new();
        let err = store.fetch(&id("nope"), None).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_conditional_fetch_times_out_as_not_modified() {
        let store = MemoryStore::new().with_hold(Duration::from_secs(5));
        let etag = store.insert(id("g"), "00");

        let start = tokio::time::Instant::now();
        let response = store.fetch(&id("g"), Some(&etag)).await.unwrap();
        assert_eq!(response, FetchResponse::NotModified);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_conditional_fetch_with_stale_etag_returns_immediately() {
        let store = MemoryStore::new();
        store.insert(id("g"), "0010");
        let stale = content_etag("00");
        let response = store.fetch(&id("g"), Some(&stale)).await.unwrap();
        assert!(matches!(response, FetchResponse::Modified { body, .. } if body == "0010"));
    }

    #[tokio::test]
    async fn test_conditional_fetch_wakes_on_replace() {
        let store = Arc::new(MemoryStore::new());
        let etag = store.insert(id("g"), "00");

        let waiter = {
            let store = Arc::clone(&store);
            let etag = etag.clone();
            tokio::spawn(async move { store.fetch(&id("g"), Some(&etag)).await })
        };
        tokio::task::yield_now().await;

        let response = store.replace(&id("g"), "0010", &etag).await.unwrap();
        assert_eq!(response, ReplaceResponse::Accepted);

        let fetched = waiter.await.unwrap().unwrap();
        assert_eq!(
            fetched,
            FetchResponse::Modified {
                body: "0010".into(),
                etag: Some(content_etag("0010"))
            }
        );
    }

    #[tokio::test]
    async fn test_replace_requires_current_etag() {
        let store = MemoryStore::new();
        let e1 = store.insert(id("g"), "00");

        // B writes first
        assert_eq!(
            store.replace(&id("g"), "0010", &e1).await.unwrap(),
            ReplaceResponse::Accepted
        );
        // A still holds E1
        assert_eq!(
            store.replace(&id("g"), "0020", &e1).await.unwrap(),
            ReplaceResponse::PreconditionFailed
        );
        let (data, etag) = store.get(&id("g")).unwrap();
        assert_eq!(data, "0010");
        assert_eq!(etag, content_etag("0010"));
    }

    #[tokio::test]
    async fn test_replace_with_same_data_keeps_etag() {
        let store = MemoryStore::new();
        let e1 = store.insert(id("g"), "00");
        assert_eq!(
            store.replace(&id("g"), "00", &e1).await.unwrap(),
            ReplaceResponse::Accepted
        );
        assert_eq!(store.get(&id("g")).unwrap().1, e1);
    }

    #[tokio::test]
    async fn test_non_conditional_store_ignores_etag() {
        let store = MemoryStore::new().ignoring_conditions();
        let etag = store.insert(id("g"), "00");
        let response = store.fetch(&id("g"), Some(&etag)).await.unwrap();
        assert_eq!(
            response,
            FetchResponse::Modified {
                body: "00".into(),
                etag: Some(etag)
            }
        );
    }

    #[tokio::test]
    async fn test_store_without_etags() {
        let store = MemoryStore::new().without_etags();
        store.insert(id("g"), "00");
        let response = store.fetch(&id("g"), None).await.unwrap();
        assert_eq!(
            response,
            FetchResponse::Modified {
                body: "00".into(),
                etag: None
            }
        );
    }
}
