//! Retrieval orchestrator: concurrent category fan-out with per-category
//! deadlines and fallback substitution.
//!
//! One session per call. The three fetches run concurrently on that session,
//! each under its own timeout, so total latency tracks the slowest category
//! deadline rather than the sum. A fetch that errors, times out, or returns
//! no records is replaced by [`FallbackCatalog`] data. There is no retry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;

use crate::config::RetrievalConfig;

use super::backend::{FetchSession, RetrievalBackend};
use super::errors::RetrievalError;
use super::fallback::FallbackCatalog;
use super::types::{Category, CategoryRecords, Provenance, RetrievalQuery, RetrievalResult};

/// Per-category fetch deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryTimeouts {
    pub flights: Duration,
    pub hotels: Duration,
    pub restaurants: Duration,
}

impl CategoryTimeouts {
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            flights: timeout,
            hotels: timeout,
            restaurants: timeout,
        }
    }

    pub fn for_category(&self, category: Category) -> Duration {
        match category {
            Category::Flights => self.flights,
            Category::Hotels => self.hotels,
            Category::Restaurants => self.restaurants,
        }
    }
}

impl From<&RetrievalConfig> for CategoryTimeouts {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            flights: Duration::from_secs(config.flights_timeout_secs),
            hotels: Duration::from_secs(config.hotels_timeout_secs),
            restaurants: Duration::from_secs(config.restaurants_timeout_secs),
        }
    }
}

pub struct RetrievalOrchestrator {
    backend: Arc<dyn RetrievalBackend>,
    fallback: FallbackCatalog,
    timeouts: CategoryTimeouts,
}

impl RetrievalOrchestrator {
    pub fn new(backend: Arc<dyn RetrievalBackend>, timeouts: CategoryTimeouts) -> Self {
        Self {
            backend,
            fallback: FallbackCatalog::new(),
            timeouts,
        }
    }

    /// Gather flights, hotels and restaurants for `query`.
    ///
    /// Returns `Err` only when the session cannot be opened. Otherwise every
    /// category is present and non-empty.
    pub async fn retrieve(&self, query: &RetrievalQuery) -> Result<RetrievalResult, RetrievalError> {
        let started = Instant::now();
        let session = self.backend.open_session().await?;

        let fetches = Category::ALL
            .iter()
            .map(|category| self.fetch_or_fallback(session.as_ref(), *category, query));
        let entries = join_all(fetches).await;

        session.close().await;

        let mut result = RetrievalResult::new();
        for (records, provenance) in entries {
            result.insert(records, provenance);
        }

        tracing::info!(
            destination = %query.destination,
            flights = ?result.provenance(Category::Flights).map(|p| p.as_str()),
            hotels = ?result.provenance(Category::Hotels).map(|p| p.as_str()),
            restaurants = ?result.provenance(Category::Restaurants).map(|p| p.as_str()),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "retrieval complete"
        );

        Ok(result)
    }

    async fn fetch_or_fallback(
        &self,
        session: &dyn FetchSession,
        category: Category,
        query: &RetrievalQuery,
    ) -> (CategoryRecords, Provenance) {
        let timeout = self.timeouts.for_category(category);
        let started = Instant::now();

        let reason = match tokio::time::timeout(timeout, session.fetch(category, query)).await {
            Ok(Ok(records)) if records.category() != category => {
                format!("backend returned {} records", records.category())
            }
            Ok(Ok(records)) if !records.is_empty() => {
                tracing::debug!(
                    category = %category,
                    count = records.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "live records"
                );
                return (records, Provenance::Live);
            }
            Ok(Ok(_)) => "empty result".to_string(),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {}ms", timeout.as_millis()),
        };

        tracing::warn!(category = %category, reason = %reason, "using fallback records");
        (self.fallback.records(category, query), Provenance::Fallback)
    }
}
