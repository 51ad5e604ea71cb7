//! Plan assembler: builds generation requests and recovers plans from
//! replies.
//!
//! Requests are the fixed system directive, the recent conversation window
//! role-tagged, and one final user-role instruction block that depends on
//! the policy's action.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::DialogueConfig;
use crate::inference::ChatMessage;
use crate::retrieval::{Category, RetrievalResult};

use super::conversation::{Conversation, Role};
use super::plan::TripPlan;
use super::policy::NextAction;
use super::slots::{SlotKey, SlotStore};

// ─── Prompts ────────────────────────────────────────────────────────────────

pub const SYSTEM_PROMPT: &str = "You are TripPlanner AI, a friendly and helpful travel planning \
assistant. You have a natural conversation with users to understand their trip needs, then use \
real, current travel information to create personalized trip plans.

YOUR JOB:
1. Have a natural, conversational dialogue. Ask one question at a time, like talking to a friend.
2. Gather the information a good plan needs: destination, origin city or airport, exact travel \
dates, budget, number of travelers, and interests.
3. Once destination, origin, dates, budget and travelers are known, the system gathers real \
flight, hotel and restaurant data for you.
4. Use that data to create a detailed, personalized plan.

CONVERSATION STYLE:
- Be warm, friendly, and conversational
- Ask ONE question at a time
- Show interest in their answers
- Don't ask the same thing twice

WHEN GENERATING PLANS:
- Use real flight routes, hotel names and current prices from the provided data
- Include specific addresses, opening hours and ticket prices
- Mention seasonal considerations and local tips
- Warn about things like \"book in advance\" or \"closed on Mondays\"";

/// JSON skeleton the model is asked to fill in. `@name@` markers are
/// replaced with slot values.
const PLAN_TEMPLATE: &str = r#"```json
{
  "destination": "@destination@",
  "origin": "@origin@",
  "startDate": "@start@",
  "endDate": "@end@",
  "duration": <number of days>,
  "budget": "@budget@",
  "travelers": @travelers@,
  "flights": {
    "outbound": { "date": "@start@", "route": "<actual route>", "suggestions": ["<airline suggestions>"] },
    "return": { "date": "@end@", "route": "<actual return route>", "suggestions": ["<airline suggestions>"] }
  },
  "accommodation": {
    "type": "@accommodation@",
    "recommendations": ["<recommendations based on their preferences>"],
    "estimatedCost": "<cost estimate>"
  },
  "itinerary": [
    {
      "day": 1,
      "date": "@start@",
      "activities": [
        { "time": "<time>", "activity": "<activity matching their interests>", "location": "<location>", "notes": "<notes>" }
      ]
    }
  ],
  "transport": { "type": "<transportation method>", "recommendations": ["<recommendations>"] },
  "activities": [
    { "name": "<activity name>", "location": "<location>", "description": "<description>", "estimatedCost": "<cost>" }
  ],
  "totalEstimatedCost": "<total estimate>",
  "notes": "<personalized notes>"
}
```"#;

/// A fenced code block. Group 1 is the language tag (possibly empty),
/// group 2 the body.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```([A-Za-z0-9_+-]*)\s*([\s\S]*?)\s*```").expect("fence pattern must compile")
});

// ─── Request Building ───────────────────────────────────────────────────────

/// Everything the generative backend needs for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone)]
pub struct PlanAssembler {
    history_window: usize,
}

impl PlanAssembler {
    pub fn new(config: &DialogueConfig) -> Self {
        Self {
            history_window: config.history_window,
        }
    }

    pub fn build_request(
        &self,
        action: &NextAction,
        slots: &SlotStore,
        conversation: &Conversation,
        retrieval: Option<&RetrievalResult>,
    ) -> GenerationRequest {
        let mut messages: Vec<ChatMessage> = conversation
            .recent(self.history_window)
            .iter()
            .map(|turn| match turn.role {
                Role::User => ChatMessage::user(turn.text.as_str()),
                Role::Assistant => ChatMessage::assistant(turn.text.as_str()),
            })
            .collect();

        let instruction = match action {
            NextAction::AskSlot { slot, question } => question_instruction(*slot, question, slots),
            NextAction::RequestGeneration { .. } => {
                generation_instruction(slots, &conversation.transcript(), retrieval)
            }
        };
        messages.push(ChatMessage::user(instruction));

        GenerationRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            messages,
        }
    }
}

impl Default for PlanAssembler {
    fn default() -> Self {
        Self::new(&DialogueConfig::default())
    }
}

fn question_instruction(slot: SlotKey, question: &str, slots: &SlotStore) -> String {
    match (slot, slots.destination.as_deref()) {
        (SlotKey::Destination, _) | (_, None) => format!(
            "The user hasn't mentioned a destination yet. Ask them in a friendly, \
             conversational way: \"{question}\"\n\nBe warm and engaging."
        ),
        (_, Some(destination)) => format!(
            "You're having a great conversation! The user wants to visit {destination}.\n\n\
             Ask them this question naturally: \"{question}\"\n\n\
             Show you're listening and that you need this specific info to do proper research \
             for them. Be warm and conversational, not robotic. Do not produce a trip plan yet."
        ),
    }
}

/// Slot values with the defaults used when generating before every slot
/// is filled.
struct Snapshot<'a> {
    destination: &'a str,
    origin: &'a str,
    start: &'a str,
    end: &'a str,
    budget: &'a str,
    travelers: u32,
    accommodation: &'static str,
    interests: String,
}

impl<'a> Snapshot<'a> {
    fn new(slots: &'a SlotStore) -> Self {
        Self {
            destination: slots.destination.as_deref().unwrap_or("the destination"),
            origin: slots.origin.as_deref().unwrap_or("their location"),
            start: slots.start_date.as_deref().unwrap_or("the start date"),
            end: slots
                .end_date
                .as_deref()
                .or(slots.start_date.as_deref())
                .unwrap_or("the end date"),
            budget: slots.budget.as_deref().unwrap_or("$2000"),
            travelers: slots.travelers.unwrap_or(2),
            accommodation: slots.accommodation_type.map_or("hotel", |a| a.as_str()),
            interests: slots
                .interests_label()
                .unwrap_or_else(|| "general sightseeing".to_string()),
        }
    }

    fn template(&self) -> String {
        PLAN_TEMPLATE
            .replace("@destination@", self.destination)
            .replace("@origin@", self.origin)
            .replace("@start@", self.start)
            .replace("@end@", self.end)
            .replace("@budget@", self.budget)
            .replace("@travelers@", &self.travelers.to_string())
            .replace("@accommodation@", self.accommodation)
    }
}

fn generation_instruction(
    slots: &SlotStore,
    transcript: &str,
    retrieval: Option<&RetrievalResult>,
) -> String {
    let s = Snapshot::new(slots);

    let mut preferences = format!(
        "- Destination: {}\n- Origin: {}\n- Dates: {} to {}\n- Budget: {}\n- Travelers: {}\n\
         - Accommodation: {}\n- Interests: {}",
        s.destination, s.origin, s.start, s.end, s.budget, s.travelers, s.accommodation, s.interests
    );
    if let Some(transport) = slots.transport_preferences.as_deref() {
        preferences.push_str(&format!("\n- Transport preferences: {transport}"));
    }
    if let Some(requirements) = slots.special_requirements.as_deref() {
        preferences.push_str(&format!("\n- Special requirements: {requirements}"));
    }

    let data = Category::ALL
        .iter()
        .map(|category| {
            let body = retrieval
                .and_then(|r| r.pretty_json(*category))
                .unwrap_or_else(|| format!("Real {} data will be provided", category.noun()));
            format!("{} DATA:\n{body}", category.noun().to_uppercase())
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Based on your conversation with the user, create a PERSONALIZED trip plan using real, \
         current information.\n\n\
         CONVERSATION CONTEXT:\n{transcript}\n\n\
         EXTRACTED PREFERENCES:\n{preferences}\n\n\
         STOP ASKING QUESTIONS. YOU HAVE ENOUGH INFORMATION TO GENERATE THE PLAN.\n\n\
         Use this travel data to create the plan:\n\n{data}\n\n\
         Personalize the plan:\n\
         - Focus activities on their interests: {interests}\n\
         - Reflect their budget: {budget} per person for the entire trip\n\
         - Plan for {travelers} travelers flying from {origin} to {destination}\n\
         - Give specific addresses, current prices, booking tips and transport details\n\n\
         First respond conversationally (2-3 sentences) acknowledging what they shared, then \
         provide the JSON plan:\n\n{template}",
        interests = s.interests,
        budget = s.budget,
        travelers = s.travelers,
        origin = s.origin,
        destination = s.destination,
        template = s.template(),
    )
}

// ─── Plan Parsing ───────────────────────────────────────────────────────────

/// Recover a [`TripPlan`] from a generation reply.
///
/// Candidates are tried in order: fenced blocks tagged `json`, the other
/// fenced blocks, then the span from the first `{` to the last `}`. The
/// first candidate that deserializes strictly wins.
pub fn parse_plan(text: &str) -> Option<TripPlan> {
    let (tagged, untagged): (Vec<_>, Vec<_>) = FENCED_BLOCK
        .captures_iter(text)
        .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .partition(|(lang, _)| lang.eq_ignore_ascii_case("json"));

    let candidates = tagged
        .into_iter()
        .chain(untagged)
        .map(|(_, body)| body)
        .chain(extract_json(text));

    let mut last_error = None;
    for candidate in candidates {
        match serde_json::from_str::<TripPlan>(candidate) {
            Ok(plan) => return Some(plan),
            Err(e) => last_error = Some(e),
        }
    }
    if let Some(e) = last_error {
        tracing::debug!(error = %e, "reply did not contain a valid plan");
    }
    None
}

/// Span from the first `{` to the last `}`, if well-ordered.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

// ─── Tests ──────────────────────────────────────────────────────────────────
