//! Shared test doubles
//!
//! A configurable in-memory [`AgentBackend`] so the conversation core,
//! hydrator, and approval gate can be exercised without a network. The
//! fake records every call for assertions and can hold a chat response
//! behind a semaphore to simulate an in-flight request.

use crate::backend::{
    AgentBackend, ChartPoint, ChatResponse, DatabaseStatusResponse, ExecuteSqlResponse,
    HistoryMessage, HistoryResponse, Row, UploadResponse,
};
use crate::error::{Result, TabletalkError};

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

#[derive(Default)]
struct FakeState {
    fail_transport: AtomicBool,
    history_fail: AtomicBool,
    chat_answer: Mutex<Option<String>>,
    chat_session: Mutex<Option<String>>,
    chat_proposal: Mutex<Option<(String, bool)>>,
    chat_chart: Mutex<Option<(Vec<ChartPoint>, Option<String>)>>,
    chat_gate: Mutex<Option<Arc<Semaphore>>>,
    history: Mutex<Option<Vec<HistoryMessage>>>,
    execute: Mutex<Option<ExecuteSqlResponse>>,
    upload: Mutex<Option<UploadResponse>>,
    status: Mutex<Option<DatabaseStatusResponse>>,
    submitted: Mutex<Vec<(String, String)>>,
    executed: Mutex<Vec<String>>,
    uploaded: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

/// In-memory agent backend for tests
///
/// Clones share state, so a test can keep a handle for assertions while
/// the controller owns the backend.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the answer returned by `submit_turn`
    pub fn with_chat_answer(self, answer: &str) -> Self {
        *self.state.chat_answer.lock().unwrap() = Some(answer.to_string());
        self
    }

    /// Rotate the session token in chat responses
    ///
    /// By default the fake echoes the request session back unchanged.
    pub fn with_chat_session(self, session: &str) -> Self {
        *self.state.chat_session.lock().unwrap() = Some(session.to_string());
        self
    }

    /// Attach a SQL proposal to chat responses
    pub fn with_chat_proposal(self, sql: &str, requires_approval: bool) -> Self {
        *self.state.chat_proposal.lock().unwrap() = Some((sql.to_string(), requires_approval));
        self
    }

    /// Attach chart data to chat responses
    pub fn with_chat_chart(self, points: Vec<(&str, f64)>, kind: Option<&str>) -> Self {
        let points = points
            .into_iter()
            .map(|(category, value)| ChartPoint::new(category, value))
            .collect();
        *self.state.chat_chart.lock().unwrap() = Some((points, kind.map(str::to_string)));
        self
    }

    /// Set the history returned by `load_history`
    pub fn with_history(self, messages: Vec<HistoryMessage>) -> Self {
        *self.state.history.lock().unwrap() = Some(messages);
        self
    }

    /// Make `load_history` fail
    pub fn with_history_failure(self) -> Self {
        self.state.history_fail.store(true, Ordering::SeqCst);
        self
    }

    /// Make `execute_sql` succeed with the given row count and rows
    pub fn with_execute_success(self, row_count: usize, rows: Vec<Row>) -> Self {
        *self.state.execute.lock().unwrap() = Some(ExecuteSqlResponse {
            success: true,
            message: None,
            error: None,
            row_count: Some(row_count),
            data: Some(rows),
        });
        self
    }

    /// Make `execute_sql` report a backend-side failure
    pub fn with_execute_failure(self, error: &str) -> Self {
        *self.state.execute.lock().unwrap() = Some(ExecuteSqlResponse {
            success: false,
            message: None,
            error: Some(error.to_string()),
            row_count: None,
            data: None,
        });
        self
    }

    /// Set the response returned by `upload_file`
    pub fn with_upload_response(self, response: UploadResponse) -> Self {
        *self.state.upload.lock().unwrap() = Some(response);
        self
    }

    /// Set the response returned by `database_status`
    pub fn with_status(self, response: DatabaseStatusResponse) -> Self {
        *self.state.status.lock().unwrap() = Some(response);
        self
    }

    /// Make every operation fail at the transport level
    pub fn with_transport_failure(self) -> Self {
        self.state.fail_transport.store(true, Ordering::SeqCst);
        self
    }

    /// Hold chat responses until a permit is added to the returned gate
    pub fn gate_chat(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.state.chat_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Queries recorded by `submit_turn` as (query, session) pairs
    pub fn submitted_turns(&self) -> Vec<(String, String)> {
        self.state.submitted.lock().unwrap().clone()
    }

    /// Statements recorded by `execute_sql`
    pub fn executed_sql(&self) -> Vec<String> {
        self.state.executed.lock().unwrap().clone()
    }

    /// File names recorded by `upload_file`
    pub fn uploaded_files(&self) -> Vec<String> {
        self.state.uploaded.lock().unwrap().clone()
    }

    /// Sessions recorded by `delete_database`
    pub fn deleted_sessions(&self) -> Vec<String> {
        self.state.deleted.lock().unwrap().clone()
    }

    fn transport_error(&self, operation: &str) -> anyhow::Error {
        TabletalkError::Backend(format!("simulated transport failure in {}", operation)).into()
    }
}

#[async_trait]
impl AgentBackend for FakeBackend {
    async fn submit_turn(&self, query: &str, session: &str) -> Result<ChatResponse> {
        self.state
            .submitted
            .lock()
            .unwrap()
            .push((query.to_string(), session.to_string()));

        let gate = self.state.chat_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let permit = gate.acquire().await.expect("chat gate closed");
            permit.forget();
        }

        if self.state.fail_transport.load(Ordering::SeqCst) {
            return Err(self.transport_error("submit_turn"));
        }

        let (chart_data, chart_type) = match self.state.chat_chart.lock().unwrap().clone() {
            Some((points, kind)) => (Some(points), kind),
            None => (None, None),
        };
        let (sql_query, requires_approval) = match self.state.chat_proposal.lock().unwrap().clone()
        {
            Some((sql, required)) => (Some(sql), required),
            None => (None, false),
        };

        Ok(ChatResponse {
            answer: self
                .state
                .chat_answer
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| "ok".to_string()),
            session_id: self
                .state
                .chat_session
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| session.to_string()),
            chart_data,
            chart_type,
            sql_query,
            requires_approval,
            error: None,
        })
    }

    async fn load_history(&self, _session: &str) -> Result<HistoryResponse> {
        if self.state.fail_transport.load(Ordering::SeqCst)
            || self.state.history_fail.load(Ordering::SeqCst)
        {
            return Err(self.transport_error("load_history"));
        }

        let messages = self
            .state
            .history
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_default();
        let count = messages.len();
        Ok(HistoryResponse { messages, count })
    }

    async fn execute_sql(&self, sql: &str, _session: &str) -> Result<ExecuteSqlResponse> {
        self.state.executed.lock().unwrap().push(sql.to_string());

        if self.state.fail_transport.load(Ordering::SeqCst) {
            return Err(self.transport_error("execute_sql"));
        }

        Ok(self
            .state
            .execute
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(ExecuteSqlResponse {
                success: true,
                message: None,
                error: None,
                row_count: Some(0),
                data: None,
            }))
    }

    async fn upload_file(
        &self,
        file_name: &str,
        _bytes: Vec<u8>,
        _session: &str,
    ) -> Result<UploadResponse> {
        self.state
            .uploaded
            .lock()
            .unwrap()
            .push(file_name.to_string());

        if self.state.fail_transport.load(Ordering::SeqCst) {
            return Err(self.transport_error("upload_file"));
        }

        Ok(self
            .state
            .upload
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(UploadResponse {
                success: true,
                message: "uploaded".to_string(),
                table_name: Some("user_data".to_string()),
                row_count: Some(0),
                column_count: Some(0),
                columns: None,
            }))
    }

    async fn database_status(&self, _session: &str) -> Result<DatabaseStatusResponse> {
        if self.state.fail_transport.load(Ordering::SeqCst) {
            return Err(self.transport_error("database_status"));
        }

        Ok(self
            .state
            .status
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(DatabaseStatusResponse {
                has_database: false,
                metadata: None,
            }))
    }

    async fn delete_database(&self, session: &str) -> Result<()> {
        self.state.deleted.lock().unwrap().push(session.to_string());

        if self.state.fail_transport.load(Ordering::SeqCst) {
            return Err(self.transport_error("delete_database"));
        }

        Ok(())
    }
}
