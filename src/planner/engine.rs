//! TripPlanner: the per-turn entry point.
//!
//! One call handles one user utterance end to end:
//!
//! 1. Validate the utterance
//! 2. Extract preferences into a new slot store
//! 3. Append the user turn and let the policy decide
//! 4. Gather retrieval data when generating with retrieval-ready slots
//! 5. Build the request, call the backend, try to parse a plan
//! 6. Append the assistant turn and return the new state
//!
//! Inputs are borrowed and outputs are fresh values, so an error leaves the
//! caller's state exactly as it was.

use std::sync::Arc;

use serde::Serialize;

use crate::config::DialogueConfig;
use crate::inference::GenerativeBackend;
use crate::retrieval::{RetrievalOrchestrator, RetrievalQuery, RetrievalResult};

use super::assembler::{parse_plan, PlanAssembler};
use super::conversation::Conversation;
use super::errors::PlannerError;
use super::extractor::extract_preferences;
use super::plan::TripPlan;
use super::policy::{DialoguePolicy, NextAction};
use super::slots::SlotStore;

/// Caller-held state plus the new utterance.
#[derive(Debug, Clone, Copy)]
pub struct TurnRequest<'a> {
    pub utterance: &'a str,
    pub slots: &'a SlotStore,
    pub history: &'a Conversation,
    /// User turns processed so far, not counting this one.
    pub turn_count: usize,
}

/// Result of a processed turn. Replaces the caller's state wholesale.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub slots: SlotStore,
    pub history: Conversation,
    pub action: NextAction,
    pub assistant_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<TripPlan>,
    pub turn_count: usize,
    /// Destination known and a plan parsed.
    pub complete: bool,
}

pub struct TripPlanner {
    backend: Arc<dyn GenerativeBackend>,
    retrieval: RetrievalOrchestrator,
    policy: DialoguePolicy,
    assembler: PlanAssembler,
}

impl TripPlanner {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        retrieval: RetrievalOrchestrator,
        dialogue: &DialogueConfig,
    ) -> Self {
        Self {
            backend,
            retrieval,
            policy: DialoguePolicy::new(dialogue),
            assembler: PlanAssembler::new(dialogue),
        }
    }

    pub async fn process_turn(&self, request: TurnRequest<'_>) -> Result<TurnOutcome, PlannerError> {
        let utterance = request.utterance.trim();
        if utterance.is_empty() {
            return Err(PlannerError::InvalidInput {
                reason: "utterance is empty".into(),
            });
        }

        let slots = extract_preferences(utterance, request.slots);
        let mut history = request.history.clone();
        history.push_user(utterance);

        let turn_count = request.turn_count + 1;
        let action = self.policy.decide(&slots, turn_count);

        tracing::info!(
            turn = turn_count,
            action = action.label(),
            missing = slots.missing_slots().len(),
            retrieval_ready = slots.is_retrieval_ready(),
            "turn decided"
        );

        let retrieval = if action.is_generation() && slots.is_retrieval_ready() {
            self.gather(&slots).await
        } else {
            None
        };

        let generation = self
            .assembler
            .build_request(&action, &slots, &history, retrieval.as_ref());

        let assistant_text = self
            .backend
            .complete(&generation.system_prompt, &generation.messages)
            .await
            .map_err(|e| {
                tracing::error!(turn = turn_count, error = %e, "generation failed");
                PlannerError::from(e)
            })?;

        let plan = parse_plan(&assistant_text);
        let complete = slots.has_destination() && plan.is_some();
        if action.is_generation() && plan.is_none() {
            tracing::debug!(turn = turn_count, "generation reply carried no plan");
        }

        history.push_assistant(assistant_text.as_str());

        Ok(TurnOutcome {
            slots,
            history,
            action,
            assistant_text,
            plan,
            turn_count,
            complete,
        })
    }

    async fn gather(&self, slots: &SlotStore) -> Option<RetrievalResult> {
        let query = RetrievalQuery::from_slots(slots)?;
        match self.retrieval.retrieve(&query).await {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!(error = %e, "retrieval unavailable, generating without live data");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::inference::{ChatMessage, InferenceError};
    use crate::planner::slots::SlotKey;
    use crate::retrieval::{
        Category, CategoryRecords, CategoryTimeouts, FetchSession, RetrievalBackend,
        RetrievalError,
    };

    const PLAN_REPLY: &str = "I've researched everything for you!\n\n```json\n{
        \"destination\": \"Paris\", \"origin\": \"New York\", \"startDate\": \"June 5, 2024\",
        \"endDate\": \"June 13, 2024\", \"duration\": 8, \"budget\": \"$2000\", \"travelers\": 2
    }\n```";

    // ─── Mocks ───────────────────────────────────────────────────────────

    #[derive(Default)]
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<String, InferenceError>>>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedBackend {
        fn replying(replies: Vec<Result<String, InferenceError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_instruction(&self) -> String {
            let requests = self.requests.lock().unwrap();
            requests.last().unwrap().last().unwrap().content.clone()
        }
    }

    #[async_trait]
    impl GenerativeBackend for ScriptedBackend {
        async fn complete(
            &self,
            _system_prompt: &str,
            messages: &[ChatMessage],
        ) -> Result<String, InferenceError> {
            self.requests.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("Tell me more!".to_string()))
        }
    }

    /// Every fetch fails; counts session opens and closes.
    #[derive(Default)]
    struct BrokenRetrieval {
        fail_open: bool,
        opened: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
    }

    struct BrokenSession {
        closed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RetrievalBackend for BrokenRetrieval {
        async fn open_session(&self) -> Result<Box<dyn FetchSession>, RetrievalError> {
            if self.fail_open {
                return Err(RetrievalError::SessionFailed {
                    reason: "no browser".into(),
                });
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(BrokenSession {
                closed: self.closed.clone(),
            }))
        }
    }

    #[async_trait]
    impl FetchSession for BrokenSession {
        async fn fetch(
            &self,
            category: Category,
            _query: &RetrievalQuery,
        ) -> Result<CategoryRecords, RetrievalError> {
            Err(RetrievalError::FetchFailed {
                category,
                reason: "blocked".into(),
            })
        }

        async fn close(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn planner(backend: Arc<ScriptedBackend>, retrieval: BrokenRetrieval) -> TripPlanner {
        let orchestrator = RetrievalOrchestrator::new(
            Arc::new(retrieval),
            CategoryTimeouts::uniform(Duration::from_secs(1)),
        );
        TripPlanner::new(backend, orchestrator, &DialogueConfig::default())
    }

    fn paris_from_new_york() -> SlotStore {
        SlotStore {
            destination: Some("Paris".into()),
            origin: Some("New York".into()),
            ..SlotStore::default()
        }
    }

    // ─── Tests ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn blank_utterance_is_rejected_before_generation() {
        let backend = ScriptedBackend::replying(vec![]);
        let planner = planner(backend.clone(), BrokenRetrieval::default());
        let slots = SlotStore::default();
        let history = Conversation::new();
        for utterance in ["", "   ", "\n\t"] {
            let err = planner
                .process_turn(TurnRequest {
                    utterance,
                    slots: &slots,
                    history: &history,
                    turn_count: 0,
                })
                .await
                .unwrap_err();
            assert!(matches!(err, PlannerError::InvalidInput { .. }));
        }
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn first_turn_asks_for_dates() {
        let backend = ScriptedBackend::replying(vec![Ok("When are you traveling?".into())]);
        let retrieval = BrokenRetrieval::default();
        let opened = retrieval.opened.clone();
        let planner = planner(backend.clone(), retrieval);

        let outcome = planner
            .process_turn(TurnRequest {
                utterance: "I want to visit Paris from New York in June",
                slots: &SlotStore::default(),
                history: &Conversation::new(),
                turn_count: 0,
            })
            .await
            .unwrap();

        assert_eq!(outcome.slots.destination.as_deref(), Some("Paris"));
        assert_eq!(outcome.slots.origin.as_deref(), Some("New York"));
        assert!(matches!(outcome.action, NextAction::AskSlot { slot: SlotKey::Dates, .. }));
        assert_eq!(outcome.assistant_text, "When are you traveling?");
        assert!(outcome.plan.is_none());
        assert!(!outcome.complete);
        assert_eq!(outcome.turn_count, 1);
        assert_eq!(outcome.history.len(), 2);
        assert_eq!(opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ready_slots_retrieve_with_fallback_and_complete() {
        let backend = ScriptedBackend::replying(vec![Ok(PLAN_REPLY.into())]);
        let retrieval = BrokenRetrieval::default();
        let (opened, closed) = (retrieval.opened.clone(), retrieval.closed.clone());
        let planner = planner(backend.clone(), retrieval);

        let prior = paris_from_new_york();
        let mut history = Conversation::new();
        history.push_user("I want to visit Paris from New York in June");
        history.push_assistant("When are you traveling?");

        let outcome = planner
            .process_turn(TurnRequest {
                utterance: "June 5-13, budget $2000, 2 people",
                slots: &prior,
                history: &history,
                turn_count: 1,
            })
            .await
            .unwrap();

        assert_eq!(outcome.slots.start_date.as_deref(), Some("June 5, 2024"));
        assert_eq!(outcome.slots.end_date.as_deref(), Some("June 13, 2024"));
        assert_eq!(outcome.slots.budget.as_deref(), Some("$2000"));
        assert_eq!(outcome.slots.travelers, Some(2));
        assert_eq!(outcome.action, NextAction::RequestGeneration { with_retrieval: true });
        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert_eq!(closed.load(Ordering::SeqCst), 1);

        let instruction = backend.last_instruction();
        assert!(instruction.contains("Delta Airlines"));
        assert!(instruction.contains("Hôtel des Grands Boulevards"));
        assert!(instruction.contains("Bouillon Chartier"));

        assert!(outcome.complete);
        assert_eq!(outcome.plan.as_ref().unwrap().duration, 8);
        assert_eq!(outcome.turn_count, 2);
        assert_eq!(outcome.history.len(), 4);
        assert_eq!(prior, paris_from_new_york());
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn session_failure_still_generates() {
        let backend = ScriptedBackend::replying(vec![Ok(PLAN_REPLY.into())]);
        let retrieval = BrokenRetrieval {
            fail_open: true,
            ..BrokenRetrieval::default()
        };
        let planner = planner(backend.clone(), retrieval);

        let outcome = planner
            .process_turn(TurnRequest {
                utterance: "June 5-13, budget $2000, 2 people",
                slots: &paris_from_new_york(),
                history: &Conversation::new(),
                turn_count: 1,
            })
            .await
            .unwrap();

        assert!(outcome.complete);
        assert!(backend
            .last_instruction()
            .contains("Real flight data will be provided"));
    }

    #[tokio::test]
    async fn generation_without_ready_slots_skips_retrieval() {
        let backend = ScriptedBackend::replying(vec![Ok("Here's a rough idea.".into())]);
        let retrieval = BrokenRetrieval::default();
        let opened = retrieval.opened.clone();
        let planner = planner(backend.clone(), retrieval);

        let slots = SlotStore {
            destination: Some("Rome".into()),
            ..SlotStore::default()
        };
        let outcome = planner
            .process_turn(TurnRequest {
                utterance: "not sure yet",
                slots: &slots,
                history: &Conversation::new(),
                turn_count: 5,
            })
            .await
            .unwrap();

        assert_eq!(outcome.action, NextAction::RequestGeneration { with_retrieval: false });
        assert_eq!(opened.load(Ordering::SeqCst), 0);
        assert!(outcome.plan.is_none());
        assert!(!outcome.complete);
    }

    #[tokio::test]
    async fn backend_failures_are_surfaced_and_state_untouched() {
        let backend = ScriptedBackend::replying(vec![
            Err(InferenceError::MissingCredentials {
                checked: vec!["GITHUB_TOKEN".into()],
            }),
            Err(InferenceError::HttpError {
                status: 503,
                body: "overloaded".into(),
            }),
        ]);
        let planner = planner(backend.clone(), BrokenRetrieval::default());
        let prior = paris_from_new_york();
        let history = Conversation::new();
        let request = TurnRequest {
            utterance: "We'd like a trip to Rome",
            slots: &prior,
            history: &history,
            turn_count: 0,
        };

        let err = planner.process_turn(request).await.unwrap_err();
        assert!(matches!(err, PlannerError::MissingCredentials { .. }));

        let err = planner.process_turn(request).await.unwrap_err();
        assert!(matches!(err, PlannerError::Generation { .. }));

        assert_eq!(prior.destination.as_deref(), Some("Paris"));
        assert!(history.is_empty());
    }
}
