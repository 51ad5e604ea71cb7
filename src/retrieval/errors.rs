//! Retrieval error types.
//!
//! Only [`RetrievalError::SessionFailed`] ever leaves the orchestrator;
//! per-fetch failures are absorbed into fallback data.

use thiserror::Error;

use super::types::Category;

#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The backend could not open a fetch session.
    #[error("failed to open retrieval session: {reason}")]
    SessionFailed { reason: String },

    /// No retrieval endpoint is configured.
    #[error("retrieval endpoint not configured")]
    NotConfigured,

    /// A single category fetch failed.
    #[error("{category} fetch failed: {reason}")]
    FetchFailed { category: Category, reason: String },

    /// The endpoint answered but the body was not a record list.
    #[error("{category} payload invalid: {reason}")]
    InvalidPayload { category: Category, reason: String },
}
