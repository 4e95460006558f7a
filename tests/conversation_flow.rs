//! End-to-end conversation flow tests over a mock agent server
//!
//! Exercises the turn controller, hydration, and the approval gate the
//! way the chat loop drives them, with the real HTTP backend pointed at
//! wiremock.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tabletalk::approval::{ApprovalGate, ApprovalState};
use tabletalk::backend::{AgentBackend, HttpBackend};
use tabletalk::config::BackendConfig;
use tabletalk::conversation::{Role, SubmitOutcome, TurnController};
use tabletalk::session::{FileSessionStore, MemorySessionStore, SessionManager};

const GREETING: &str = "Hello! I am your SQL data analyst.";

fn http_backend(server: &MockServer) -> Arc<HttpBackend> {
    Arc::new(
        HttpBackend::new(BackendConfig {
            base_url: server.uri(),
            timeout_seconds: 5,
        })
        .unwrap(),
    )
}

fn memory_sessions() -> SessionManager {
    SessionManager::with_store(Arc::new(MemorySessionStore::new()))
}

async fn mount_empty_history(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [],
            "count": 0
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_successful_turn_grows_log_by_two() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "You have 100 rows.",
            "session_id": "sess-1"
        })))
        .mount(&server)
        .await;

    let controller =
        TurnController::new(http_backend(&server), memory_sessions(), GREETING).unwrap();
    assert_eq!(controller.log_len(), 1);

    let outcome = controller.submit("how many rows?").await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Submitted);
    assert_eq!(controller.log_len(), 3);

    let messages = controller.messages();
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[2].content, "You have 100 rows.");
}

#[tokio::test]
async fn test_failed_turn_grows_log_by_one_plus_fixed_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let controller =
        TurnController::new(http_backend(&server), memory_sessions(), GREETING).unwrap();

    let outcome = controller.submit("hello").await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Failed);

    let messages = controller.messages();
    assert_eq!(messages.len(), 3);
    // The user message survives the failure
    assert_eq!(messages[1].content, "hello");
    // The error message is fixed and does not leak internal detail
    assert!(!messages[2].content.contains("502"));
    assert!(messages[2].content.contains("went wrong"));
}

#[tokio::test]
async fn test_hydration_replaces_greeting_with_server_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"}
            ],
            "count": 2
        })))
        .mount(&server)
        .await;

    let controller =
        TurnController::new(http_backend(&server), memory_sessions(), GREETING).unwrap();
    controller.hydrate().await;

    let messages = controller.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "hi");
    assert_eq!(messages[1].content, "hello");
    // No seeded greeting prepended
    assert_ne!(messages[0].content, GREETING);
}

#[tokio::test]
async fn test_hydration_empty_history_keeps_seeded_greeting() {
    let server = MockServer::start().await;
    mount_empty_history(&server).await;

    let controller =
        TurnController::new(http_backend(&server), memory_sessions(), GREETING).unwrap();
    controller.hydrate().await;

    let messages = controller.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, GREETING);
}

#[tokio::test]
async fn test_hydration_failure_never_blocks_the_chat() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .respond_with(ResponseTemplate::new(500).set_body_string("history store down"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "still works",
            "session_id": "sess-1"
        })))
        .mount(&server)
        .await;

    let controller =
        TurnController::new(http_backend(&server), memory_sessions(), GREETING).unwrap();
    controller.hydrate().await;

    assert_eq!(controller.log_len(), 1);
    // The chat is still usable after the hydration failure
    let outcome = controller.submit("ping").await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Submitted);
}

#[tokio::test]
async fn test_reset_rotates_persisted_session_and_reseeds_log() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "ok",
            "session_id": "sess-1"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = FileSessionStore::with_path(dir.path().join("token"));
    let sessions = SessionManager::with_store(Arc::new(store));

    let controller = TurnController::new(http_backend(&server), sessions, GREETING).unwrap();
    controller.submit("a question").await.unwrap();

    let old_session = controller.session();
    controller.reset().unwrap();

    assert_eq!(controller.log_len(), 1);
    assert_eq!(controller.messages()[0].content, GREETING);
    assert_ne!(controller.session(), old_session);
    assert!(!controller.session().is_empty());
}

#[tokio::test]
async fn test_approval_flow_executes_edited_sql_and_appends_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "I prepared a query.",
            "session_id": "sess-1",
            "sql_query": "SELECT 1",
            "requires_approval": true
        })))
        .mount(&server)
        .await;
    // The edited statement, not the original proposal, must be executed
    Mock::given(method("POST"))
        .and(path("/execute-sql"))
        .and(body_json(json!({
            "sql": "SELECT 2",
            "session_id": "sess-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "row_count": 3,
            "data": [{"n": 1}, {"n": 2}, {"n": 3}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = http_backend(&server);
    let sessions = memory_sessions();
    sessions.adopt("sess-1").unwrap();
    let controller = TurnController::new(backend.clone(), sessions, GREETING).unwrap();

    controller.submit("show me something").await.unwrap();

    let messages = controller.messages();
    let proposal = messages.last().unwrap();
    assert!(proposal.has_pending_sql());

    let mut gate = ApprovalGate::new(
        proposal.proposed_sql.clone().unwrap(),
        controller.gate_sender(),
    );
    gate.toggle_editing();
    assert!(gate.edit("SELECT 2"));
    gate.execute(backend.as_ref(), &controller.session())
        .await
        .unwrap();

    match gate.state() {
        ApprovalState::Resolved(outcome) => assert!(outcome.success),
        other => panic!("unexpected gate state: {:?}", other),
    }

    let before = controller.log_len();
    let appended = controller.drain_gate_outcomes();
    assert_eq!(appended, 1);
    assert_eq!(controller.log_len(), before + 1);

    let messages = controller.messages();
    let result_turn = messages.last().unwrap();
    assert_eq!(result_turn.role, Role::Assistant);
    // The row count is reflected in the synthesized turn's text
    assert!(result_turn.content.contains("3 row(s)"));
    assert_eq!(result_turn.rows.as_ref().unwrap().len(), 3);
    // The original proposal message was not mutated
    let proposal_again = &messages[messages.len() - 2];
    assert_eq!(proposal_again.proposed_sql.as_deref(), Some("SELECT 1"));
}

#[tokio::test]
async fn test_failed_execution_appends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute-sql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Only SELECT statements are allowed."
        })))
        .mount(&server)
        .await;

    let backend = http_backend(&server);
    let controller = TurnController::new(backend.clone(), memory_sessions(), GREETING).unwrap();

    let mut gate = ApprovalGate::new("DELETE FROM albums", controller.gate_sender());
    gate.execute(backend.as_ref(), &controller.session())
        .await
        .unwrap();

    assert!(matches!(
        gate.state(),
        ApprovalState::Resolved(outcome) if !outcome.success
    ));
    // Failure stays scoped to the gate panel; the log is untouched
    assert_eq!(controller.drain_gate_outcomes(), 0);
    assert_eq!(controller.log_len(), 1);
}
