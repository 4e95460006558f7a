//! Turn controller: one request/response cycle at a time
//!
//! Drives submission of user queries to the agent backend and owns the
//! loading state. There is no error state: failures resolve into an
//! appended assistant message and the controller returns to `Idle`.
//!
//! In-flight requests are tagged with the session they were issued for;
//! a response whose tag no longer matches the active session (because a
//! reset rotated it meanwhile) is dropped on arrival.

use crate::approval::GateOutcome;
use crate::backend::{AgentBackend, ChartKind, ChartPayload};
use crate::conversation::{hydrate, ChatMessage, ConversationLog};
use crate::error::Result;
use crate::session::SessionManager;

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Fixed user-facing message appended when a turn fails
///
/// Internal error detail is logged, never shown; the user's original
/// message stays in the log so retry is a fresh submit.
pub const TURN_FAILURE_MESSAGE: &str =
    "Sorry, something went wrong. Please try again.";

/// Controller state for the chat-turn path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Ready to accept a submission
    Idle,
    /// A submission is in flight; further submissions are refused
    Submitting,
}

/// Result of a `submit` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The turn completed and an assistant message was appended
    Submitted,
    /// The turn failed and the fixed error message was appended
    Failed,
    /// Blank input; nothing was sent and the log is unchanged
    Ignored,
    /// Another submission was already in flight
    Busy,
    /// The response arrived for a session that was reset meanwhile
    Stale,
}

struct Inner {
    log: ConversationLog,
    state: TurnState,
    active_session: String,
}

/// Drives conversation turns and owns the conversation log
///
/// Methods take `&self`; state lives behind a mutex that is never held
/// across an await, so approval-gate executions may run concurrently
/// with a submission. Appends are commutative: final order is arrival
/// order.
pub struct TurnController {
    backend: Arc<dyn AgentBackend>,
    sessions: SessionManager,
    inner: Mutex<Inner>,
    gate_tx: UnboundedSender<GateOutcome>,
    gate_rx: Mutex<UnboundedReceiver<GateOutcome>>,
}

impl TurnController {
    /// Create a controller over a backend and session manager
    ///
    /// Acquires the active session (creating one if needed) and seeds
    /// the log with the greeting.
    pub fn new(
        backend: Arc<dyn AgentBackend>,
        sessions: SessionManager,
        greeting: impl Into<String>,
    ) -> Result<Self> {
        let active_session = sessions.get_or_create()?;
        let (gate_tx, gate_rx) = mpsc::unbounded_channel();

        Ok(Self {
            backend,
            sessions,
            inner: Mutex::new(Inner {
                log: ConversationLog::new(greeting),
                state: TurnState::Idle,
                active_session,
            }),
            gate_tx,
            gate_rx: Mutex::new(gate_rx),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The active session token
    pub fn session(&self) -> String {
        self.lock().active_session.clone()
    }

    /// Current controller state
    pub fn state(&self) -> TurnState {
        self.lock().state
    }

    /// Whether a submission is in flight (the submit affordance should
    /// be disabled while this is true)
    pub fn is_submitting(&self) -> bool {
        self.state() == TurnState::Submitting
    }

    /// Snapshot of the conversation log, in render order
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().log.messages().to_vec()
    }

    /// Number of messages in the log
    pub fn log_len(&self) -> usize {
        self.lock().log.len()
    }

    /// Sender half of the gate outcome channel
    ///
    /// Each approval gate gets a clone; outcomes flow one way, from gate
    /// to controller.
    pub fn gate_sender(&self) -> UnboundedSender<GateOutcome> {
        self.gate_tx.clone()
    }

    /// Populate the log from server-side history
    ///
    /// Invoked once per session acquisition. A non-empty history replaces
    /// the seeded greeting; an empty history or any failure leaves the
    /// greeting in place. Hydration never surfaces an error.
    pub async fn hydrate(&self) {
        let session = self.session();
        if let Some(history) = hydrate::load(self.backend.as_ref(), &session).await {
            self.lock().log.hydrate(history);
        }
    }

    /// Submit one user query
    ///
    /// No-op on blank input or while a submission is in flight. The user
    /// message is appended optimistically, before the network call, and
    /// is never rolled back.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }

        let tag = {
            let mut inner = self.lock();
            if inner.state == TurnState::Submitting {
                return Ok(SubmitOutcome::Busy);
            }
            inner.state = TurnState::Submitting;
            inner.log.push(ChatMessage::user(trimmed));
            inner.active_session.clone()
        };

        let result = self.backend.submit_turn(trimmed, &tag).await;

        let mut inner = self.lock();
        if inner.active_session != tag {
            // A reset rotated the session while this request was in
            // flight; the log already belongs to the new session.
            tracing::debug!("Dropping turn response issued for a rotated session");
            return Ok(SubmitOutcome::Stale);
        }
        inner.state = TurnState::Idle;

        match result {
            Ok(resp) => {
                if !resp.session_id.is_empty() && resp.session_id != inner.active_session {
                    if let Err(e) = self.sessions.adopt(&resp.session_id) {
                        tracing::warn!("Failed to persist rotated session token: {}", e);
                    }
                    inner.active_session = resp.session_id.clone();
                }

                let mut message = ChatMessage::assistant(resp.answer);
                if let Some(points) = resp.chart_data {
                    if !points.is_empty() {
                        let kind = resp
                            .chart_type
                            .as_deref()
                            .map(ChartKind::from_hint)
                            .unwrap_or(ChartKind::Bar);
                        message = message.with_chart(ChartPayload { kind, points });
                    }
                }
                if let Some(sql) = resp.sql_query {
                    message = message.with_proposal(sql, resp.requires_approval);
                }

                inner.log.push(message);
                Ok(SubmitOutcome::Submitted)
            }
            Err(e) => {
                tracing::warn!("Turn submission failed: {}", e);
                inner.log.push(ChatMessage::assistant(TURN_FAILURE_MESSAGE));
                Ok(SubmitOutcome::Failed)
            }
        }
    }

    /// Reset the conversation and rotate the session
    ///
    /// The log returns to the single seeded greeting and a fresh token
    /// is created. Any in-flight submission for the old session will be
    /// dropped on arrival.
    pub fn reset(&self) -> Result<String> {
        self.sessions.reset()?;
        let fresh = self.sessions.get_or_create()?;

        let mut inner = self.lock();
        inner.active_session = fresh.clone();
        inner.log.reset();
        inner.state = TurnState::Idle;

        tracing::info!("Conversation reset; session rotated");
        Ok(fresh)
    }

    /// Append any pending gate outcomes as assistant turns
    ///
    /// Returns the number of turns appended. Gate results re-enter the
    /// conversation here as normal ordered turns rather than mutating
    /// history.
    pub fn drain_gate_outcomes(&self) -> usize {
        let mut rx = self.gate_rx.lock().unwrap_or_else(|e| e.into_inner());
        let mut appended = 0;

        while let Ok(outcome) = rx.try_recv() {
            let mut message = ChatMessage::assistant(outcome.summary);
            if let Some(rows) = outcome.rows {
                if !rows.is_empty() {
                    message = message.with_rows(rows);
                }
            }
            self.lock().log.push(message);
            appended += 1;
        }

        appended
    }
}
