//! REST client seam for managed registration authorities.
//!
//! Providers never talk HTTP themselves; they go through the
//! [`RegistrationClient`] trait so that tests can script the authority and
//! embedders can swap transports. [`HttpRegistrationClient`] is the real
//! implementation, speaking the JSON:API dialect the DOI authorities use.

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::AuthorityCredentials;
use crate::error::{RegistrarError, Result};
use crate::models::record::Record;

/// Errors from a remote registration authority.
///
/// These never cross the provider boundary: providers translate them into a
/// returned `false` (or, for restore, a fatal `NotFound` outside sandbox).
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("authority returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("identifier not found at the authority")]
    NotFound,

    /// The authority already holds this identifier with identical payload.
    /// Callers treat this as success, not as an error (idempotent retries).
    #[error("identifier already registered at the authority")]
    AlreadyRegistered,

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

pub type RemoteResult = std::result::Result<(), RemoteError>;

/// Pure serialization seam: record -> authority metadata document. The full
/// serializer is owned by a collaborator outside this core; the default
/// covers the fields registration itself requires.
pub type MetadataSerializer = fn(&Record) -> Value;

/// Minimal metadata document for DOI registration.
pub fn default_doi_metadata(record: &Record) -> Value {
    json!({
        "titles": [{ "title": record.metadata.title.clone().unwrap_or_default() }],
        "publisher": record.metadata.publisher.clone().unwrap_or_default(),
    })
}

/// Per-authority REST surface used by managed providers.
#[async_trait]
pub trait RegistrationClient: Send + Sync {
    /// Authority name, for diagnostics.
    fn authority(&self) -> &str;

    /// Make the identifier publicly resolvable at `url`.
    async fn publish(&self, doi: &str, url: &str, metadata: &Value) -> RemoteResult;

    /// Push updated metadata for an already-registered identifier.
    async fn update(&self, doi: &str, url: &str, metadata: &Value) -> RemoteResult;

    /// Withdraw the identifier from public resolution, keeping it registered.
    async fn hide(&self, doi: &str) -> RemoteResult;

    /// Re-show a previously hidden identifier.
    async fn show(&self, doi: &str) -> RemoteResult;

    /// Remove a draft that never became publicly resolvable.
    async fn delete_draft(&self, doi: &str) -> RemoteResult;
}

/// HTTP implementation over the authority's `/dois` endpoints.
pub struct HttpRegistrationClient {
    authority: String,
    credentials: AuthorityCredentials,
    http: reqwest::Client,
}

impl HttpRegistrationClient {
    pub fn new<A: Into<String>>(authority: A, credentials: AuthorityCredentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| {
                RegistrarError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self {
            authority: authority.into(),
            credentials,
            http,
        })
    }

    fn doi_endpoint(&self, doi: &str) -> String {
        format!("{}/dois/{}", self.credentials.base_url.trim_end_matches('/'), doi)
    }

    fn attributes_payload(attributes: Value) -> Value {
        json!({ "data": { "type": "dois", "attributes": attributes } })
    }

    async fn put(&self, doi: &str, attributes: Value) -> RemoteResult {
        let response = self
            .http
            .put(self.doi_endpoint(doi))
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .json(&Self::attributes_payload(attributes))
            .send()
            .await?;
        Self::check(response).await
    }

    async fn check(response: reqwest::Response) -> RemoteResult {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status.as_u16() == 404 {
            return Err(RemoteError::NotFound);
        }
        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 422 && body.contains("already been taken") {
            return Err(RemoteError::AlreadyRegistered);
        }
        Err(RemoteError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RegistrationClient for HttpRegistrationClient {
    fn authority(&self) -> &str {
        &self.authority
    }

    async fn publish(&self, doi: &str, url: &str, metadata: &Value) -> RemoteResult {
        let mut attributes = metadata.clone();
        if let Some(map) = attributes.as_object_mut() {
            map.insert("event".to_string(), json!("publish"));
            map.insert("doi".to_string(), json!(doi));
            map.insert("url".to_string(), json!(url));
        }
        self.put(doi, attributes).await
    }

    async fn update(&self, doi: &str, url: &str, metadata: &Value) -> RemoteResult {
        let mut attributes = metadata.clone();
        if let Some(map) = attributes.as_object_mut() {
            map.insert("url".to_string(), json!(url));
        }
        self.put(doi, attributes).await
    }

    async fn hide(&self, doi: &str) -> RemoteResult {
        self.put(doi, json!({ "event": "hide" })).await
    }

    async fn show(&self, doi: &str) -> RemoteResult {
        self.put(doi, json!({ "event": "publish" })).await
    }

    async fn delete_draft(&self, doi: &str) -> RemoteResult {
        let response = self
            .http
            .delete(self.doi_endpoint(doi))
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await?;
        Self::check(response).await
    }
}
