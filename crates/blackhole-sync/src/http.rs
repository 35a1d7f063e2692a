//! HTTP state store client.
//!
//! Talks to a state server exposing:
//! - `GET <states_url>/<id>`: 200 with body and `ETag`, or 304 when the
//!   `If-None-Match` ETag is still current (the server may hold the request
//!   open until the state changes)
//! - `PUT <states_url>/<id>` with `If-Match`: 200, or 412 if stale
//! - `POST <states_url>`: creates a game, answers with its id

use crate::protocol::{state_url, ETag, StateId};
use crate::store::{FetchResponse, ReplaceResponse, StateStore, StoreError};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, ETAG, IF_MATCH, IF_NONE_MATCH};
use reqwest::StatusCode;
use tracing::debug;

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StoreError::Timeout
        } else {
            StoreError::Request(e.to_string())
        }
    }
}

/// State store reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    states_url: String,
}

impl HttpStore {
    /// Create a store client for the collection at `states_url`.
    pub fn new(states_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), states_url)
    }

    /// Use a preconfigured client, e.g. with custom timeouts.
    pub fn with_client(client: reqwest::Client, states_url: impl Into<String>) -> Self {
        Self {
            client,
            states_url: states_url.into(),
        }
    }

    pub fn states_url(&self) -> &str {
        &self.states_url
    }
}

#[async_trait]
impl StateStore for HttpStore {
    async fn fetch(
        &self,
        id: &StateId,
        if_none_match: Option<&ETag>,
    ) -> Result<FetchResponse, StoreError> {
        let mut request = self.client.get(state_url(&self.states_url, id));
        if let Some(etag) = if_none_match {
            request = request.header(IF_NONE_MATCH, etag.as_str());
        }
        let response = request.send().await?;
        debug!(id = %id, status = %response.status(), "GET state");

        match response.status() {
            StatusCode::NOT_MODIFIED => Ok(FetchResponse::NotModified),
            StatusCode::OK => {
                let etag = response
                    .headers()
                    .get(ETAG)
                    .and_then(|value| value.to_str().ok())
                    .map(ETag::new);
                let body = response.text().await?;
                Ok(FetchResponse::Modified { body, etag })
            }
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(id.clone())),
            status => Err(StoreError::UnexpectedStatus(status.as_u16())),
        }
    }

    async fn replace(
        &self,
        id: &StateId,
        body: &str,
        if_match: &ETag,
    ) -> Result<ReplaceResponse, StoreError> {
        let response = self
            .client
            .put(state_url(&self.states_url, id))
            .header(IF_MATCH, if_match.as_str())
            .header(CONTENT_TYPE, "text/plain")
            .body(body.to_string())
            .send()
            .await?;
        debug!(id = %id, status = %response.status(), "PUT state");

        match response.status() {
            StatusCode::OK => Ok(ReplaceResponse::Accepted),
            StatusCode::PRECONDITION_FAILED => Ok(ReplaceResponse::PreconditionFailed),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(id.clone())),
            status => Err(StoreError::UnexpectedStatus(status.as_u16())),
        }
    }

    async fn create(&self, body: &str) -> Result<StateId, StoreError> {
        let response = self
            .client
            .post(&self.states_url)
            .header(CONTENT_TYPE, "text/plain")
            .body(body.to_string())
            .send()
            .await?;
        debug!(status = %response.status(), "POST state");

        if response.status() != StatusCode::OK {
            return Err(StoreError::UnexpectedStatus(response.status().as_u16()));
        }
        let text = response.text().await?;
        StateId::parse(&text).map_err(|_| StoreError::MissingStateId)
    }
}
