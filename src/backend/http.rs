//! HTTP implementation of the agent backend
//!
//! Connects to the agent service over its JSON API. Non-success statuses
//! are mapped to `Backend` errors carrying the status and response body,
//! so callers never have to inspect raw responses.

use crate::backend::types::{
    ChatRequest, ChatResponse, DatabaseStatusResponse, ExecuteSqlRequest, ExecuteSqlResponse,
    HistoryResponse, UploadResponse,
};
use crate::backend::AgentBackend;
use crate::config::BackendConfig;
use crate::error::{Result, TabletalkError};

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::{Client, Response};
use std::time::Duration;

/// HTTP agent backend
///
/// # Examples
///
/// ```no_run
/// use tabletalk::backend::{AgentBackend, HttpBackend};
/// use tabletalk::config::BackendConfig;
///
/// # async fn example() -> tabletalk::error::Result<()> {
/// let config = BackendConfig {
///     base_url: "http://localhost:8000/api/v1".to_string(),
///     timeout_seconds: 120,
/// };
/// let backend = HttpBackend::new(config)?;
/// let response = backend.submit_turn("How many rows?", "session-1").await?;
/// println!("{}", response.answer);
/// # Ok(())
/// # }
/// ```
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new HTTP backend instance
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client initialization fails.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("tabletalk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TabletalkError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();

        tracing::info!("Initialized agent backend: base_url={}", base_url);

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Map a non-success response to a `Backend` error with status and body
    async fn check_status(response: Response, operation: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!("{} returned {}: {}", operation, status, body);
        Err(TabletalkError::Backend(format!("{} returned {}: {}", operation, status, body)).into())
    }
}

#[async_trait]
impl AgentBackend for HttpBackend {
    async fn submit_turn(&self, query: &str, session: &str) -> Result<ChatResponse> {
        let url = self.endpoint("chat");
        tracing::debug!("Submitting turn to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest {
                query: query.to_string(),
                session_id: session.to_string(),
            })
            .send()
            .await
            .map_err(|e| TabletalkError::Backend(format!("Failed to reach agent: {}", e)))?;

        let response = Self::check_status(response, "chat").await?;
        let parsed: ChatResponse = response.json().await.map_err(|e| {
            TabletalkError::Backend(format!("Failed to parse chat response: {}", e))
        })?;
        Ok(parsed)
    }

    async fn load_history(&self, session: &str) -> Result<HistoryResponse> {
        let url = self.endpoint("history");
        tracing::debug!("Loading history from {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("session_id", session)])
            .send()
            .await
            .map_err(|e| TabletalkError::History(format!("Failed to reach agent: {}", e)))?;

        let response = Self::check_status(response, "history").await?;
        let parsed: HistoryResponse = response.json().await.map_err(|e| {
            TabletalkError::History(format!("Failed to parse history response: {}", e))
        })?;
        Ok(parsed)
    }

    async fn execute_sql(&self, sql: &str, session: &str) -> Result<ExecuteSqlResponse> {
        let url = self.endpoint("execute-sql");
        tracing::debug!("Executing SQL via {}", url);

        let response = self
            .client
            .post(&url)
            .json(&ExecuteSqlRequest {
                sql: sql.to_string(),
                session_id: session.to_string(),
            })
            .send()
            .await
            .map_err(|e| TabletalkError::Execution(format!("Failed to reach agent: {}", e)))?;

        let response = Self::check_status(response, "execute-sql").await?;
        let parsed: ExecuteSqlResponse = response.json().await.map_err(|e| {
            TabletalkError::Execution(format!("Failed to parse execution response: {}", e))
        })?;
        Ok(parsed)
    }

    async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        session: &str,
    ) -> Result<UploadResponse> {
        let url = self.endpoint("upload");
        tracing::debug!("Uploading {} ({} bytes) to {}", file_name, bytes.len(), url);

        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .query(&[("session_id", session)])
            .multipart(form)
            .send()
            .await
            .map_err(|e| TabletalkError::Upload(format!("Failed to reach agent: {}", e)))?;

        let response = Self::check_status(response, "upload").await?;
        let parsed: UploadResponse = response.json().await.map_err(|e| {
            TabletalkError::Upload(format!("Failed to parse upload response: {}", e))
        })?;
        Ok(parsed)
    }

    async fn database_status(&self, session: &str) -> Result<DatabaseStatusResponse> {
        let url = self.endpoint("database-status");
        tracing::debug!("Checking database status via {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("session_id", session)])
            .send()
            .await
            .map_err(|e| TabletalkError::Backend(format!("Failed to reach agent: {}", e)))?;

        let response = Self::check_status(response, "database-status").await?;
        let parsed: DatabaseStatusResponse = response.json().await.map_err(|e| {
            TabletalkError::Backend(format!("Failed to parse status response: {}", e))
        })?;
        Ok(parsed)
    }

    async fn delete_database(&self, session: &str) -> Result<()> {
        let url = self.endpoint("database");
        tracing::debug!("Deleting database via {}", url);

        let response = self
            .client
            .delete(&url)
            .query(&[("session_id", session)])
            .send()
            .await
            .map_err(|e| TabletalkError::Backend(format!("Failed to reach agent: {}", e)))?;

        Self::check_status(response, "delete-database").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: &str) -> BackendConfig {
        BackendConfig {
            base_url: base_url.to_string(),
            timeout_seconds: 5,
        }
    }

    #[test]
    fn test_new_builds_client() {
        let backend = HttpBackend::new(test_config("http://localhost:8000/api/v1"));
        assert!(backend.is_ok());
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let backend = HttpBackend::new(test_config("http://localhost:8000/api/v1")).unwrap();
        assert_eq!(
            backend.endpoint("chat"),
            "http://localhost:8000/api/v1/chat"
        );
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let backend = HttpBackend::new(test_config("http://localhost:8000/api/v1/")).unwrap();
        assert_eq!(
            backend.endpoint("history"),
            "http://localhost:8000/api/v1/history"
        );
    }
}
