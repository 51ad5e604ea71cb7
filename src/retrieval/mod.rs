//! Retrieval: live travel data gathered before plan generation.
//!
//! - `backend`: the session-based fetch seam and the HTTP implementation
//! - `orchestrator`: concurrent per-category fetches with deadlines
//! - `fallback`: static records substituted for failed categories

pub mod backend;
pub mod errors;
pub mod fallback;
pub mod orchestrator;
pub mod types;

pub use backend::{FetchSession, HttpRetrievalBackend, RetrievalBackend};
pub use errors::RetrievalError;
pub use fallback::FallbackCatalog;
pub use orchestrator::{CategoryTimeouts, RetrievalOrchestrator};
pub use types::{
    Category, CategoryRecords, FlightOption, HotelOption, Provenance, RestaurantOption,
    RetrievalQuery, RetrievalResult,
};
