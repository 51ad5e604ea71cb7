//! Retrieval data types: categories, per-category records, and the query
//! derived from the slot store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::planner::airports;
use crate::planner::slots::{Interest, SlotStore};

// ─── Category ───────────────────────────────────────────────────────────────

/// One kind of travel data gathered before generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Flights,
    Hotels,
    Restaurants,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Flights, Category::Hotels, Category::Restaurants];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Flights => "flights",
            Category::Hotels => "hotels",
            Category::Restaurants => "restaurants",
        }
    }

    /// Singular noun used in prompt placeholders ("Real flight data ...").
    pub fn noun(&self) -> &'static str {
        match self {
            Category::Flights => "flight",
            Category::Hotels => "hotel",
            Category::Restaurants => "restaurant",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Records ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOption {
    pub airline: String,
    pub route: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub price: String,
    pub stops: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelOption {
    pub name: String,
    pub address: String,
    pub price: String,
    pub rating: String,
    pub neighborhood: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantOption {
    pub name: String,
    pub address: String,
    pub cuisine: String,
    pub price_range: String,
    pub rating: String,
}

/// Records for a single category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CategoryRecords {
    Flights(Vec<FlightOption>),
    Hotels(Vec<HotelOption>),
    Restaurants(Vec<RestaurantOption>),
}

impl CategoryRecords {
    pub fn category(&self) -> Category {
        match self {
            CategoryRecords::Flights(_) => Category::Flights,
            CategoryRecords::Hotels(_) => Category::Hotels,
            CategoryRecords::Restaurants(_) => Category::Restaurants,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CategoryRecords::Flights(v) => v.len(),
            CategoryRecords::Hotels(v) => v.len(),
            CategoryRecords::Restaurants(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode a JSON array of records for `category`.
    pub fn from_json(category: Category, value: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match category {
            Category::Flights => CategoryRecords::Flights(serde_json::from_value(value)?),
            Category::Hotels => CategoryRecords::Hotels(serde_json::from_value(value)?),
            Category::Restaurants => CategoryRecords::Restaurants(serde_json::from_value(value)?),
        })
    }
}

// ─── Result ─────────────────────────────────────────────────────────────────

/// Where a category's records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Live,
    Fallback,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Live => "live",
            Provenance::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CategoryEntry {
    records: CategoryRecords,
    provenance: Provenance,
}

/// Data gathered for one generation turn, keyed by category.
///
/// Provenance is tracked per entry but never serialized into prompts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    entries: BTreeMap<Category, CategoryEntry>,
}

impl RetrievalResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, records: CategoryRecords, provenance: Provenance) {
        self.entries
            .insert(records.category(), CategoryEntry { records, provenance });
    }

    pub fn records(&self, category: Category) -> Option<&CategoryRecords> {
        self.entries.get(&category).map(|e| &e.records)
    }

    pub fn provenance(&self, category: Category) -> Option<Provenance> {
        self.entries.get(&category).map(|e| e.provenance)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records for `category` as pretty-printed JSON.
    pub fn pretty_json(&self, category: Category) -> Option<String> {
        self.records(category)
            .and_then(|records| serde_json::to_string_pretty(records).ok())
    }
}

// ─── Query ──────────────────────────────────────────────────────────────────

/// The slot values retrieval needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalQuery {
    pub destination: String,
    pub origin: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<String>,
    pub travelers: Option<u32>,
    pub interests: Vec<Interest>,
}

impl RetrievalQuery {
    /// `None` when no destination is known.
    pub fn from_slots(slots: &SlotStore) -> Option<Self> {
        Some(Self {
            destination: slots.destination.clone()?,
            origin: slots.origin.clone(),
            start_date: slots.start_date.clone(),
            end_date: slots.end_date.clone(),
            budget: slots.budget.clone(),
            travelers: slots.travelers,
            interests: slots.interests.clone().unwrap_or_default(),
        })
    }

    pub fn origin_code(&self) -> String {
        match self.origin.as_deref() {
            Some(origin) => airports::code_for_location(origin),
            None => airports::DEFAULT_ORIGIN_CODE.to_string(),
        }
    }

    pub fn destination_code(&self) -> String {
        airports::code_for_location(&self.destination)
    }

    /// Free-text search phrase for `category`.
    pub fn search_phrase(&self, category: Category) -> String {
        let start = self.start_date.as_deref().unwrap_or("");
        let end = self.end_date.as_deref().unwrap_or("");
        let phrase = match category {
            Category::Flights => format!(
                "flights from {} to {} {start}",
                self.origin_code(),
                self.destination_code()
            ),
            Category::Hotels => format!("hotels in {} {start} to {end}", self.destination),
            Category::Restaurants => format!("restaurants in {}", self.destination),
        };
        phrase.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> RetrievalQuery {
        RetrievalQuery {
            destination: "Paris".into(),
            origin: Some("New York (JFK)".into()),
            start_date: Some("June 5, 2024".into()),
            end_date: Some("June 13, 2024".into()),
            ..RetrievalQuery::default()
        }
    }

    #[test]
    fn search_phrases() {
        let q = query();
        assert_eq!(q.search_phrase(Category::Flights), "flights from JFK to CDG June 5, 2024");
        assert_eq!(
            q.search_phrase(Category::Hotels),
            "hotels in Paris June 5, 2024 to June 13, 2024"
        );
        assert_eq!(q.search_phrase(Category::Restaurants), "restaurants in Paris");
    }

    #[test]
    fn origin_defaults_to_rdu() {
        let q = RetrievalQuery {
            origin: None,
            ..query()
        };
        assert_eq!(q.origin_code(), "RDU");
    }

    #[test]
    fn query_requires_destination() {
        assert!(RetrievalQuery::from_slots(&SlotStore::default()).is_none());
        let slots = SlotStore {
            destination: Some("Rome".into()),
            interests: Some(vec![Interest::Culture]),
            ..SlotStore::default()
        };
        let q = RetrievalQuery::from_slots(&slots).unwrap();
        assert_eq!(q.destination, "Rome");
        assert_eq!(q.interests, vec![Interest::Culture]);
    }

    #[test]
    fn records_decode_from_json_array() {
        let value = serde_json::json!([{
            "name": "Le Train Bleu", "address": "Gare de Lyon", "cuisine": "French",
            "priceRange": "$$$", "rating": "4.4"
        }]);
        let records = CategoryRecords::from_json(Category::Restaurants, value).unwrap();
        assert_eq!(records.category(), Category::Restaurants);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn provenance_is_not_serialized() {
        let mut result = RetrievalResult::new();
        result.insert(CategoryRecords::Hotels(Vec::new()), Provenance::Fallback);
        assert_eq!(result.provenance(Category::Hotels), Some(Provenance::Fallback));
        assert_eq!(result.pretty_json(Category::Hotels).as_deref(), Some("[]"));
        assert!(result.provenance(Category::Flights).is_none());
    }
}
