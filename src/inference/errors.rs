//! Inference error types.
//!
//! All errors implement `std::error::Error` via `thiserror`. Structured logging
//! is the caller's responsibility; these types carry the context needed to
//! build meaningful log entries.

use thiserror::Error;

/// Errors that can occur while requesting a completion.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// None of the configured API key variables held a value.
    #[error("no API key found (checked: {})", checked.join(", "))]
    MissingCredentials { checked: Vec<String> },

    /// TCP/HTTP connection to the model endpoint failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The model endpoint did not respond within the configured timeout.
    #[error("inference timeout after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Non-2xx HTTP response from the model endpoint.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response carried no assistant content.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// The response body was not a chat completion.
    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },
}

impl InferenceError {
    /// Authentication problems: no key, or the endpoint rejected it.
    pub fn is_credentials_error(&self) -> bool {
        matches!(
            self,
            InferenceError::MissingCredentials { .. }
                | InferenceError::HttpError { status: 401 | 403, .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_message_lists_vars() {
        let err = InferenceError::MissingCredentials {
            checked: vec!["GITHUB_TOKEN".into(), "OPENAI_API_KEY".into()],
        };
        assert_eq!(
            err.to_string(),
            "no API key found (checked: GITHUB_TOKEN, OPENAI_API_KEY)"
        );
        assert!(err.is_credentials_error());
    }

    #[test]
    fn test_unauthorized_is_credentials_error() {
        let err = InferenceError::HttpError {
            status: 401,
            body: "bad key".into(),
        };
        assert!(err.is_credentials_error());
        assert_eq!(err.to_string(), "HTTP 401: bad key");
    }

    #[test]
    fn test_server_error_is_not_credentials_error() {
        let err = InferenceError::HttpError {
            status: 500,
            body: String::new(),
        };
        assert!(!err.is_credentials_error());
        assert!(!InferenceError::Timeout { duration_secs: 5 }.is_credentials_error());
    }
}
