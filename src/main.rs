//! Console shell: one utterance per line on stdin, replies on stdout.
//!
//! Commands: `/slots` prints the collected preferences, `/reset` starts a
//! new conversation, `/quit` exits.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use tripplanner::config::PlannerConfig;
use tripplanner::inference::InferenceClient;
use tripplanner::retrieval::{CategoryTimeouts, HttpRetrievalBackend, RetrievalOrchestrator};
use tripplanner::session::{new_session_id, InMemorySessionStore, SessionStore};
use tripplanner::{init_tracing, TripPlanner, TurnRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let config = PlannerConfig::load_or_default(&cwd).context("failed to load configuration")?;
    let log_file = init_tracing(&config.logging);

    let client = InferenceClient::from_config(&config.generation)
        .context("failed to build inference client")?;
    if !client.has_credentials() {
        eprintln!(
            "warning: no API key found in {}; replies will fail until one is set",
            config.generation.api_key_env.join(" or ")
        );
    }
    tracing::info!(model = client.model(), base_url = %config.generation.base_url, "inference client ready");

    let retrieval_backend = HttpRetrievalBackend::from_config(&config.retrieval)
        .context("failed to build retrieval backend")?;
    if !retrieval_backend.is_configured() {
        tracing::info!("no retrieval endpoint configured, fallback data only");
    }
    let orchestrator = RetrievalOrchestrator::new(
        Arc::new(retrieval_backend),
        CategoryTimeouts::from(&config.retrieval),
    );

    let planner = TripPlanner::new(Arc::new(client), orchestrator, &config.dialogue);
    let sessions = InMemorySessionStore::new(config.session.ttl_secs);
    let mut session_id = new_session_id();

    println!("TripPlanner: tell me about the trip you have in mind. (/slots, /reset, /quit)");
    if let Some(path) = log_file {
        println!("(logging to {})", path.display());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let utterance = line.trim();

        match utterance {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                sessions.remove(&session_id);
                session_id = new_session_id();
                println!("Starting over. Where would you like to go?");
                continue;
            }
            "/slots" => {
                let state = sessions.load_or_default(&session_id);
                println!("{}", serde_json::to_string_pretty(&state.slots)?);
                continue;
            }
            _ => {}
        }

        let mut state = sessions.load_or_default(&session_id);
        let result = planner
            .process_turn(TurnRequest {
                utterance,
                slots: &state.slots,
                history: &state.history,
                turn_count: state.turn_count,
            })
            .await;

        match result {
            Ok(outcome) => {
                println!("\n{}\n", outcome.assistant_text);
                if let Some(plan) = &outcome.plan {
                    println!("{}", serde_json::to_string_pretty(plan)?);
                }
                if outcome.complete {
                    sessions.remove(&session_id);
                    session_id = new_session_id();
                    println!("\n(Plan complete. Starting a new conversation.)");
                } else {
                    state.apply(&outcome);
                    sessions.save(&session_id, state);
                }
            }
            Err(e) => {
                tracing::warn!(session = %session_id, error = %e, "turn failed");
                eprintln!("error: {e}");
            }
        }

        let purged = sessions.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, "expired sessions removed");
        }
    }

    Ok(())
}
