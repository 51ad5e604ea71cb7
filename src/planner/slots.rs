//! SlotStore: the structured preference record collected over a conversation.
//!
//! A plain value type: the engine takes the prior store by reference and
//! hands back a new one, so a failed turn never mutates the caller's copy.

use serde::{Deserialize, Serialize};

// ─── Enumerations ───────────────────────────────────────────────────────────

/// Preferred kind of lodging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccommodationType {
    Hotel,
    Airbnb,
    Hostel,
}

impl AccommodationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccommodationType::Hotel => "hotel",
            AccommodationType::Airbnb => "airbnb",
            AccommodationType::Hostel => "hostel",
        }
    }
}

impl std::fmt::Display for AccommodationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interest tag from the fixed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interest {
    Sightseeing,
    Nightlife,
    Nature,
    Culture,
    Food,
}

impl Interest {
    /// Every tag, in vocabulary order.
    pub const ALL: [Interest; 5] = [
        Interest::Sightseeing,
        Interest::Nightlife,
        Interest::Nature,
        Interest::Culture,
        Interest::Food,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interest::Sightseeing => "sightseeing",
            Interest::Nightlife => "nightlife",
            Interest::Nature => "nature",
            Interest::Culture => "culture",
            Interest::Food => "food",
        }
    }
}

impl std::fmt::Display for Interest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slots the dialogue policy can ask about.
///
/// `Dates` covers both start and end date; they are asked for together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKey {
    Destination,
    Origin,
    Dates,
    Interests,
    Budget,
    Travelers,
}

impl SlotKey {
    /// Question priority: lower is asked first. Destination is a hard
    /// prerequisite and is handled before ranking, hence 0.
    pub fn priority(&self) -> u8 {
        match self {
            SlotKey::Destination => 0,
            SlotKey::Origin => 1,
            SlotKey::Dates => 2,
            SlotKey::Interests => 3,
            SlotKey::Budget => 4,
            SlotKey::Travelers => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKey::Destination => "destination",
            SlotKey::Origin => "origin",
            SlotKey::Dates => "dates",
            SlotKey::Interests => "interests",
            SlotKey::Budget => "budget",
            SlotKey::Travelers => "travelers",
        }
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── SlotStore ──────────────────────────────────────────────────────────────

/// Trip preferences gathered so far.
///
/// Dates and budget are kept as the text the user wrote (or the extractor
/// synthesized); nothing here is parsed into calendar or currency types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotStore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Always `$<amount>` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    /// Positive head count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travelers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accommodation_type: Option<AccommodationType>,
    /// Ordered by first mention in the utterance that set them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<Interest>>,
    /// Free text; set by callers, never by the extractor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_preferences: Option<String>,
    /// Free text; set by callers, never by the extractor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requirements: Option<String>,
}

impl SlotStore {
    /// A store with nothing filled in.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn has_destination(&self) -> bool {
        self.destination.is_some()
    }

    /// Both start and end date are known.
    pub fn has_dates(&self) -> bool {
        self.start_date.is_some() && self.end_date.is_some()
    }

    pub fn has_interests(&self) -> bool {
        self.interests.as_ref().is_some_and(|i| !i.is_empty())
    }

    /// All five hard slots are present: destination, origin, both dates,
    /// budget and travelers. Interests are optional.
    pub fn is_retrieval_ready(&self) -> bool {
        self.destination.is_some()
            && self.origin.is_some()
            && self.has_dates()
            && self.budget.is_some()
            && self.travelers.is_some()
    }

    /// Missing slots among origin, dates, interests, budget and travelers,
    /// sorted by question priority.
    pub fn missing_slots(&self) -> Vec<SlotKey> {
        let mut missing = Vec::new();
        if self.origin.is_none() {
            missing.push(SlotKey::Origin);
        }
        if !self.has_dates() {
            missing.push(SlotKey::Dates);
        }
        if !self.has_interests() {
            missing.push(SlotKey::Interests);
        }
        if self.budget.is_none() {
            missing.push(SlotKey::Budget);
        }
        if self.travelers.is_none() {
            missing.push(SlotKey::Travelers);
        }
        missing.sort_by_key(SlotKey::priority);
        missing
    }

    /// Whether a specific slot currently holds a value.
    pub fn is_filled(&self, key: SlotKey) -> bool {
        match key {
            SlotKey::Destination => self.destination.is_some(),
            SlotKey::Origin => self.origin.is_some(),
            SlotKey::Dates => self.has_dates(),
            SlotKey::Interests => self.has_interests(),
            SlotKey::Budget => self.budget.is_some(),
            SlotKey::Travelers => self.travelers.is_some(),
        }
    }

    /// Interests joined with `", "`, if any.
    pub fn interests_label(&self) -> Option<String> {
        self.interests
            .as_ref()
            .filter(|i| !i.is_empty())
            .map(|i| i.iter().map(Interest::as_str).collect::<Vec<_>>().join(", "))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_store() -> SlotStore {
        SlotStore {
            destination: Some("Paris".into()),
            origin: Some("New York (JFK)".into()),
            start_date: Some("June 5, 2024".into()),
            end_date: Some("June 13, 2024".into()),
            budget: Some("$2000".into()),
            travelers: Some(2),
            ..SlotStore::default()
        }
    }

    #[test]
    fn new_store_is_empty() {
        let store = SlotStore::new();
        assert!(store.is_empty());
        assert!(!store.has_destination());
        assert!(!store.is_retrieval_ready());
    }

    #[test]
    fn missing_slots_sorted_by_priority() {
        let store = SlotStore {
            destination: Some("Paris".into()),
            budget: Some("$500".into()),
            ..SlotStore::default()
        };
        assert_eq!(
            store.missing_slots(),
            vec![SlotKey::Origin, SlotKey::Dates, SlotKey::Interests, SlotKey::Travelers]
        );
    }

    #[test]
    fn half_a_date_range_is_still_missing() {
        let store = SlotStore {
            start_date: Some("June 5".into()),
            ..SlotStore::default()
        };
        assert!(!store.has_dates());
        assert!(store.missing_slots().contains(&SlotKey::Dates));
    }

    #[test]
    fn retrieval_ready_ignores_interests() {
        let store = ready_store();
        assert!(store.is_retrieval_ready());
        assert_eq!(store.missing_slots(), vec![SlotKey::Interests]);
    }

    #[test]
    fn empty_interest_list_counts_as_missing() {
        let store = SlotStore {
            interests: Some(Vec::new()),
            ..SlotStore::default()
        };
        assert!(!store.has_interests());
        assert!(store.interests_label().is_none());
    }

    #[test]
    fn serializes_camel_case_and_skips_unset() {
        let store = SlotStore {
            start_date: Some("June 5, 2024".into()),
            accommodation_type: Some(AccommodationType::Airbnb),
            interests: Some(vec![Interest::Food, Interest::Culture]),
            ..SlotStore::default()
        };
        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json["startDate"], "June 5, 2024");
        assert_eq!(json["accommodationType"], "airbnb");
        assert_eq!(json["interests"], serde_json::json!(["food", "culture"]));
        assert!(json.get("destination").is_none());
    }

    #[test]
    fn interests_label_keeps_order() {
        let store = SlotStore {
            interests: Some(vec![Interest::Nightlife, Interest::Sightseeing]),
            ..SlotStore::default()
        };
        assert_eq!(store.interests_label().as_deref(), Some("nightlife, sightseeing"));
    }
}
