//! Agent backend abstraction for Tabletalk
//!
//! This module defines the [`AgentBackend`] trait covering every boundary
//! operation against the remote natural-language-to-SQL service, the wire
//! types exchanged with it, and the HTTP implementation.

pub mod http;
pub mod types;

pub use http::HttpBackend;
pub use types::{
    ChartKind, ChartPayload, ChartPoint, ChatRequest, ChatResponse, DatabaseMetadata,
    DatabaseStatusResponse, ExecuteSqlRequest, ExecuteSqlResponse, HistoryMessage,
    HistoryResponse, Row, UploadResponse,
};

use crate::error::Result;
use async_trait::async_trait;

/// Transport to the remote agent service
///
/// Every suspension point of the client goes through this trait, so the
/// whole conversation core can be exercised against an in-memory fake.
/// All operations resolve to success or failure; there is no streaming.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Submit one user query for the given session
    async fn submit_turn(&self, query: &str, session: &str) -> Result<ChatResponse>;

    /// Load prior turns for the given session
    async fn load_history(&self, session: &str) -> Result<HistoryResponse>;

    /// Execute a SQL statement against the session's database
    async fn execute_sql(&self, sql: &str, session: &str) -> Result<ExecuteSqlResponse>;

    /// Upload a tabular file to become the session's database
    async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        session: &str,
    ) -> Result<UploadResponse>;

    /// Check whether the session has an uploaded database
    async fn database_status(&self, session: &str) -> Result<DatabaseStatusResponse>;

    /// Delete the session's uploaded database
    async fn delete_database(&self, session: &str) -> Result<()>;
}
