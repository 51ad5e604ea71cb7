//! TripPlan: the structured plan recovered from a generation reply.
//!
//! Required fields are strict: a reply missing any of them, or carrying a
//! non-integer `duration`/`travelers`, is not a plan. Everything else is
//! optional and defaults to empty. Cost fields take a string or a bare
//! number.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPlan {
    pub destination: String,
    pub origin: String,
    pub start_date: String,
    pub end_date: String,
    pub duration: u32,
    pub budget: String,
    pub travelers: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flights: Option<FlightPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accommodation: Option<AccommodationPlan>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub itinerary: Vec<ItineraryDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportPlan>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activities: Vec<ActivitySuggestion>,
    #[serde(default, deserialize_with = "cost_text", skip_serializing_if = "Option::is_none")]
    pub total_estimated_cost: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound: Option<FlightLeg>,
    #[serde(rename = "return", default, skip_serializing_if = "Option::is_none")]
    pub return_leg: Option<FlightLeg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightLeg {
    pub date: String,
    pub route: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccommodationPlan {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default, deserialize_with = "cost_text", skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryDay {
    pub day: u32,
    pub date: String,
    #[serde(default)]
    pub activities: Vec<ScheduledActivity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledActivity {
    pub time: String,
    pub activity: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportPlan {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySuggestion {
    pub name: String,
    pub location: String,
    pub description: String,
    #[serde(default, deserialize_with = "cost_text", skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CostValue {
    Text(String),
    Number(serde_json::Number),
}

fn cost_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<CostValue>::deserialize(deserializer)?.map(|value| match value {
        CostValue::Text(text) => text,
        CostValue::Number(number) => number.to_string(),
    }))
}
