//! Errors surfaced by [`TripPlanner::process_turn`](super::TripPlanner::process_turn).
//!
//! Extraction misses, retrieval failures and unparseable plans never become
//! errors; they are absorbed inside the turn.

use thiserror::Error;

use crate::inference::InferenceError;

#[derive(Debug, Error)]
pub enum PlannerError {
    /// Empty or whitespace-only utterance. Rejected before any processing.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The generative backend has no usable API key.
    #[error("missing credentials: {reason}")]
    MissingCredentials { reason: String },

    /// The generative backend failed for any other reason.
    #[error("generation failed: {source}")]
    Generation {
        #[source]
        source: InferenceError,
    },
}

impl From<InferenceError> for PlannerError {
    fn from(err: InferenceError) -> Self {
        if err.is_credentials_error() {
            PlannerError::MissingCredentials {
                reason: err.to_string(),
            }
        } else {
            PlannerError::Generation { source: err }
        }
    }
}
