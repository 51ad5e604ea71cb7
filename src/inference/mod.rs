//! Inference Client: OpenAI-compatible API client for plan generation.
//!
//! The client speaks the OpenAI Chat Completions API, so the hosted model is
//! interchangeable via config: pointing at a local server is a `base_url`
//! change, not a code change.

pub mod client;
pub mod errors;
pub mod types;

pub use client::{GenerativeBackend, InferenceClient};
pub use errors::InferenceError;
pub use types::{ChatMessage, Role};
