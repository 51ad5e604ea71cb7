//! Dialogue policy: decides whether the next turn asks a question or
//! generates a plan.
//!
//! Pure and deterministic: the same slots and turn count always yield the
//! same action. The rules are evaluated top to bottom and the first that
//! applies wins.

use serde::Serialize;

use crate::config::DialogueConfig;

use super::slots::{SlotKey, SlotStore};

/// What the assistant should do with the current turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NextAction {
    /// Ask for one missing slot.
    AskSlot { slot: SlotKey, question: String },
    /// Produce a trip plan. `with_retrieval` asks the engine to gather live
    /// data first; the engine only does so when the slots are
    /// retrieval-ready.
    RequestGeneration { with_retrieval: bool },
}

impl NextAction {
    pub fn is_generation(&self) -> bool {
        matches!(self, NextAction::RequestGeneration { .. })
    }

    /// Short label for log fields.
    pub fn label(&self) -> &'static str {
        match self {
            NextAction::AskSlot { .. } => "ask_slot",
            NextAction::RequestGeneration { with_retrieval: true } => "generate_with_retrieval",
            NextAction::RequestGeneration { with_retrieval: false } => "generate",
        }
    }
}

/// Rule-based question/generation policy.
#[derive(Debug, Clone)]
pub struct DialoguePolicy {
    max_question_turns: usize,
    forced_generation_turns: usize,
}

impl DialoguePolicy {
    pub fn new(config: &DialogueConfig) -> Self {
        Self {
            max_question_turns: config.max_question_turns,
            forced_generation_turns: config.forced_generation_turns,
        }
    }

    /// Decide the next action. `user_turn_count` includes the utterance
    /// being processed.
    pub fn decide(&self, slots: &SlotStore, user_turn_count: usize) -> NextAction {
        if !slots.has_destination() {
            return ask(SlotKey::Destination, slots);
        }

        if slots.is_retrieval_ready() {
            return NextAction::RequestGeneration { with_retrieval: true };
        }

        if slots.has_dates() && user_turn_count >= self.forced_generation_turns {
            return NextAction::RequestGeneration { with_retrieval: true };
        }

        let missing = slots.missing_slots();
        if let Some(next) = missing.first() {
            if user_turn_count < self.max_question_turns {
                return ask(*next, slots);
            }
        }

        NextAction::RequestGeneration { with_retrieval: false }
    }
}

impl Default for DialoguePolicy {
    fn default() -> Self {
        Self::new(&DialogueConfig::default())
    }
}

fn ask(slot: SlotKey, slots: &SlotStore) -> NextAction {
    NextAction::AskSlot {
        slot,
        question: render_question(slot, slots),
    }
}

/// Question text for `slot`, interpolating what is already known.
pub fn render_question(slot: SlotKey, slots: &SlotStore) -> String {
    let destination = slots.destination.as_deref().unwrap_or("your destination");
    match slot {
        SlotKey::Destination => {
            "I'd love to help you plan an amazing trip! Where are you thinking of going?".to_string()
        }
        SlotKey::Origin => format!(
            "Great choice! {destination} is amazing. To find you the best flights and routes, \
             where will you be flying from? What city or airport?"
        ),
        SlotKey::Dates => match slots.origin.as_deref() {
            Some(origin) => format!(
                "Perfect! When are you planning to travel from {origin} to {destination}? \
                 I need specific dates (like \"June 15-22\") so I can check flight availability \
                 and prices, plus see what's happening during your visit."
            ),
            None => "Perfect! When are you planning to travel? I need specific dates \
                     (like \"June 15-22\") so I can check flight availability and prices."
                .to_string(),
        },
        SlotKey::Interests => format!(
            "I want to make this trip perfect for you! What are you most excited to see or do \
             in {destination}? Museums, food, nightlife, nature, sightseeing? The more details \
             you share, the better I can research places you'll love."
        ),
        SlotKey::Budget => "To give you accurate recommendations, what's your budget range? \
                            A specific dollar amount helps me find accommodations and \
                            activities that fit."
            .to_string(),
        SlotKey::Travelers => {
            "How many people will be traveling? This helps me recommend the right \
             accommodations and activities."
                .to_string()
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
