//! Planner core: slot filling, dialogue policy and plan assembly.
//!
//! `TripPlanner::process_turn` is the single entry point. Everything below
//! it is synchronous and pure except the two outbound seams:
//! [`GenerativeBackend`](crate::inference::GenerativeBackend) and
//! [`RetrievalBackend`](crate::retrieval::RetrievalBackend).

pub mod airports;
pub mod assembler;
pub mod conversation;
pub mod engine;
pub mod errors;
pub mod extractor;
pub mod plan;
pub mod policy;
pub mod slots;

pub use assembler::{parse_plan, GenerationRequest, PlanAssembler, SYSTEM_PROMPT};
pub use conversation::{Conversation, ConversationTurn, Role};
pub use engine::{TripPlanner, TurnOutcome, TurnRequest};
pub use errors::PlannerError;
pub use extractor::extract_preferences;
pub use plan::TripPlan;
pub use policy::{DialoguePolicy, NextAction};
pub use slots::{AccommodationType, Interest, SlotKey, SlotStore};
