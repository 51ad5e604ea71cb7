//! Retrieval backend seam and the shipped HTTP implementation.
//!
//! A backend hands out short-lived fetch sessions. The orchestrator opens
//! exactly one session per generation turn, runs every category fetch on it,
//! and closes it before returning.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use uuid::Uuid;

use crate::config::RetrievalConfig;

use super::errors::RetrievalError;
use super::types::{Category, CategoryRecords, RetrievalQuery};

/// TCP connection timeout for retrieval requests. The per-category deadline
/// is enforced by the orchestrator.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Traits ─────────────────────────────────────────────────────────────────

/// Source of fetch sessions.
#[async_trait]
pub trait RetrievalBackend: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn FetchSession>, RetrievalError>;
}

/// A scoped fetch context.
#[async_trait]
pub trait FetchSession: Send + Sync {
    /// Fetch records for one category. An empty list is a valid answer.
    async fn fetch(
        &self,
        category: Category,
        query: &RetrievalQuery,
    ) -> Result<CategoryRecords, RetrievalError>;

    /// Release the session's resources. Called once, after every fetch has
    /// settled.
    async fn close(&self);
}

// ─── HTTP Backend ───────────────────────────────────────────────────────────

/// Fetches `GET {endpoint}/{category}?q=<search phrase>`, expecting a JSON
/// array of records.
///
/// Without an endpoint every fetch fails with
/// [`RetrievalError::NotConfigured`], so callers always get fallback data.
pub struct HttpRetrievalBackend {
    http: HttpClient,
    endpoint: Option<String>,
}

impl HttpRetrievalBackend {
    pub fn from_config(config: &RetrievalConfig) -> Result<Self, RetrievalError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| RetrievalError::SessionFailed {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            endpoint: config
                .endpoint
                .as_deref()
                .map(|e| e.trim_end_matches('/').to_string())
                .filter(|e| !e.is_empty()),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[async_trait]
impl RetrievalBackend for HttpRetrievalBackend {
    async fn open_session(&self) -> Result<Box<dyn FetchSession>, RetrievalError> {
        let session = HttpFetchSession {
            id: Uuid::new_v4(),
            http: self.http.clone(),
            endpoint: self.endpoint.clone(),
        };
        tracing::debug!(session = %session.id, configured = self.is_configured(), "retrieval session opened");
        Ok(Box::new(session))
    }
}

struct HttpFetchSession {
    id: Uuid,
    http: HttpClient,
    endpoint: Option<String>,
}

#[async_trait]
impl FetchSession for HttpFetchSession {
    async fn fetch(
        &self,
        category: Category,
        query: &RetrievalQuery,
    ) -> Result<CategoryRecords, RetrievalError> {
        let endpoint = self.endpoint.as_deref().ok_or(RetrievalError::NotConfigured)?;
        let url = format!("{endpoint}/{category}");

        let response = self
            .http
            .get(&url)
            .query(&[("q", query.search_phrase(category))])
            .send()
            .await
            .map_err(|e| RetrievalError::FetchFailed {
                category,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::FetchFailed {
                category,
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        let value: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| RetrievalError::InvalidPayload {
                    category,
                    reason: e.to_string(),
                })?;

        CategoryRecords::from_json(category, value).map_err(|e| RetrievalError::InvalidPayload {
            category,
            reason: e.to_string(),
        })
    }

    async fn close(&self) {
        tracing::debug!(session = %self.id, "retrieval session closed");
    }
}
