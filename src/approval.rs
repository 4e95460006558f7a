//! Approval gate for agent-proposed SQL
//!
//! Each assistant message carrying a pending SQL proposal gets its own
//! gate: a small state machine that lets the user inspect, edit, and
//! explicitly run the statement. Successful executions are announced
//! over an outcome channel and re-enter the conversation as a new
//! appended turn; failures stay scoped to the gate's own panel.
//!
//! The gate is a confirmation step, not a security control. The backend
//! is responsible for refusing non-read-only statements.

use crate::backend::{AgentBackend, Row};
use crate::error::Result;
use tokio::sync::mpsc::UnboundedSender;

/// Result of one execution, as shown inside the gate panel
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    /// Whether the backend reported success
    pub success: bool,
    /// Human-readable summary or error description
    pub detail: String,
    /// Rows returned, when reported
    pub row_count: Option<usize>,
}

/// Payload announced to the conversation when an execution succeeds
///
/// Drained by the turn controller, which appends a new assistant turn
/// built from it. Failures never produce an outcome; they are a property
/// of one gate, not of the conversation.
#[derive(Debug, Clone)]
pub struct GateOutcome {
    /// Human-readable result summary (row count included when known)
    pub summary: String,
    /// Rows returned, when reported
    pub row_count: Option<usize>,
    /// The result rows themselves, for rendering and export
    pub rows: Option<Vec<Row>>,
}

/// State of one approval gate
#[derive(Debug, Clone, PartialEq)]
pub enum ApprovalState {
    /// Initial state: the SQL is shown read-only
    Proposed,
    /// The user may mutate the working copy
    Editing,
    /// Execution request in flight
    Executing,
    /// Execution finished; terminal for this run
    Resolved(ExecutionOutcome),
}

/// Per-message approval gate
///
/// Edits act on a working copy; the original proposal on the message is
/// never mutated. Re-execution from `Resolved` simply re-enters
/// `Executing`.
pub struct ApprovalGate {
    original_sql: String,
    working_sql: String,
    state: ApprovalState,
    outcomes: UnboundedSender<GateOutcome>,
}

impl ApprovalGate {
    /// Create a gate over a proposed statement
    ///
    /// # Arguments
    ///
    /// * `proposed_sql` - The statement as proposed by the agent
    /// * `outcomes` - Channel on which successful executions are announced
    pub fn new(proposed_sql: impl Into<String>, outcomes: UnboundedSender<GateOutcome>) -> Self {
        let original_sql = proposed_sql.into();
        Self {
            working_sql: original_sql.clone(),
            original_sql,
            state: ApprovalState::Proposed,
            outcomes,
        }
    }

    /// Current gate state
    pub fn state(&self) -> &ApprovalState {
        &self.state
    }

    /// The statement as originally proposed
    pub fn original_sql(&self) -> &str {
        &self.original_sql
    }

    /// The statement that will be executed
    pub fn working_sql(&self) -> &str {
        &self.working_sql
    }

    /// Toggle between read-only and editing views
    ///
    /// Valid only in `Proposed` and `Editing`; other states ignore the
    /// toggle and return false.
    pub fn toggle_editing(&mut self) -> bool {
        match self.state {
            ApprovalState::Proposed => {
                self.state = ApprovalState::Editing;
                true
            }
            ApprovalState::Editing => {
                self.state = ApprovalState::Proposed;
                true
            }
            _ => false,
        }
    }

    /// Replace the working copy of the SQL
    ///
    /// Valid only from `Editing`. The original proposal is untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabletalk::approval::ApprovalGate;
    /// use tokio::sync::mpsc;
    ///
    /// let (tx, _rx) = mpsc::unbounded_channel();
    /// let mut gate = ApprovalGate::new("SELECT 1", tx);
    /// gate.toggle_editing();
    /// assert!(gate.edit("SELECT 2"));
    /// assert_eq!(gate.working_sql(), "SELECT 2");
    /// assert_eq!(gate.original_sql(), "SELECT 1");
    /// ```
    pub fn edit(&mut self, new_sql: impl Into<String>) -> bool {
        if self.state != ApprovalState::Editing {
            return false;
        }
        self.working_sql = new_sql.into();
        true
    }

    /// Execute the current working copy against the backend
    ///
    /// Allowed from `Proposed`, `Editing`, and `Resolved` (re-execution);
    /// a gate already `Executing` ignores the request. On success the
    /// outcome is announced on the channel; failures (backend-reported or
    /// transport) resolve locally without an announcement.
    pub async fn execute(&mut self, backend: &dyn AgentBackend, session: &str) -> Result<()> {
        if self.state == ApprovalState::Executing {
            return Ok(());
        }
        self.state = ApprovalState::Executing;

        let sql = self.working_sql.clone();
        tracing::debug!("Executing approved SQL ({} chars)", sql.len());

        match backend.execute_sql(&sql, session).await {
            Ok(resp) if resp.success => {
                let summary = build_summary(resp.message.as_deref(), resp.row_count);
                self.state = ApprovalState::Resolved(ExecutionOutcome {
                    success: true,
                    detail: summary.clone(),
                    row_count: resp.row_count,
                });

                // Receiver dropped means the conversation is gone; nothing to do.
                let _ = self.outcomes.send(GateOutcome {
                    summary,
                    row_count: resp.row_count,
                    rows: resp.data,
                });
            }
            Ok(resp) => {
                let detail = resp
                    .error
                    .or(resp.message)
                    .unwrap_or_else(|| "Query failed.".to_string());
                self.state = ApprovalState::Resolved(ExecutionOutcome {
                    success: false,
                    detail,
                    row_count: None,
                });
            }
            Err(e) => {
                tracing::warn!("SQL execution request failed: {}", e);
                self.state = ApprovalState::Resolved(ExecutionOutcome {
                    success: false,
                    detail: e.to_string(),
                    row_count: None,
                });
            }
        }

        Ok(())
    }
}

/// Build the human-readable result summary for a successful execution
fn build_summary(message: Option<&str>, row_count: Option<usize>) -> String {
    let base = message.unwrap_or("Query executed successfully.");
    match row_count {
        Some(n) => format!("{} {} row(s) returned.", base, n),
        None => base.to_string(),
    }
}
