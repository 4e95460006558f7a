//! Wire types for the agent backend API
//!
//! Request and response structures for every boundary operation. Optional
//! fields default on deserialization so older server payloads (e.g.
//! historical turns without structured metadata) never fail a whole
//! response.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A result row: ordered mapping from column name to value
///
/// Column order is preserved so rendered tables and exports match the
/// order the server produced.
pub type Row = IndexMap<String, serde_json::Value>;

/// One data point of a chart payload
///
/// The minimal required shape is `{category, value}`; any additional
/// fields pass through opaquely for rendering only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Category label for the point
    pub category: String,
    /// Numeric value for the point
    pub value: f64,
    /// Extra fields passed through untouched
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl ChartPoint {
    /// Create a point with no extra fields
    pub fn new(category: impl Into<String>, value: f64) -> Self {
        Self {
            category: category.into(),
            value,
            extra: IndexMap::new(),
        }
    }
}

/// Supported chart shapes
///
/// The server sends a free-form hint; unknown hints are carried as
/// [`ChartKind::Other`] rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Other(String),
}

impl ChartKind {
    /// Parse a chart-type hint from the server
    pub fn from_hint(hint: &str) -> Self {
        match hint.to_lowercase().as_str() {
            "bar" => Self::Bar,
            "line" => Self::Line,
            "pie" => Self::Pie,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bar => write!(f, "bar"),
            Self::Line => write!(f, "line"),
            Self::Pie => write!(f, "pie"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A chart payload: the shape hint plus its points
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPayload {
    /// Chart shape
    pub kind: ChartKind,
    /// Ordered data points
    pub points: Vec<ChartPoint>,
}

/// Request body for `POST /chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// The user's natural-language query
    pub query: String,
    /// Session token scoping history and database state
    pub session_id: String,
}

/// Response body for `POST /chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// The assistant's markdown-formatted answer
    pub answer: String,
    /// Session token, possibly rotated by the server
    pub session_id: String,
    /// Optional chart data extracted from the answer
    #[serde(default)]
    pub chart_data: Option<Vec<ChartPoint>>,
    /// Optional chart shape hint ("bar", "line", "pie", ...)
    #[serde(default)]
    pub chart_type: Option<String>,
    /// SQL statement the agent proposes to run
    #[serde(default)]
    pub sql_query: Option<String>,
    /// Whether the proposed SQL awaits user approval before execution
    #[serde(default)]
    pub requires_approval: bool,
    /// Server-side error description, if the turn failed internally
    #[serde(default)]
    pub error: Option<String>,
}

/// One historical turn from `GET /history`
///
/// Older turns may not retain structured payloads; only role and content
/// are expected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// "user" or "assistant"
    #[serde(default)]
    pub role: String,
    /// Message text
    #[serde(default)]
    pub content: String,
}

/// Response body for `GET /history`
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    /// Turns in server-provided (chronological) order
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
    /// Number of turns
    #[serde(default)]
    pub count: usize,
}

/// Request body for `POST /execute-sql`
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteSqlRequest {
    /// The SQL statement to run (the user's working copy)
    pub sql: String,
    /// Session token
    pub session_id: String,
}

/// Response body for `POST /execute-sql`
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteSqlResponse {
    /// Whether the statement ran successfully
    pub success: bool,
    /// Human-readable success summary
    #[serde(default)]
    pub message: Option<String>,
    /// Error description when `success` is false
    #[serde(default)]
    pub error: Option<String>,
    /// Number of rows the statement returned
    #[serde(default)]
    pub row_count: Option<usize>,
    /// The result rows themselves
    #[serde(default)]
    pub data: Option<Vec<Row>>,
}

/// Response body for `POST /upload`
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    /// Whether ingestion succeeded
    pub success: bool,
    /// Human-readable outcome message
    #[serde(default)]
    pub message: String,
    /// Name of the table the file became
    #[serde(default)]
    pub table_name: Option<String>,
    /// Rows ingested
    #[serde(default)]
    pub row_count: Option<usize>,
    /// Columns ingested
    #[serde(default)]
    pub column_count: Option<usize>,
    /// Column names
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

/// Metadata about a session's uploaded database
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseMetadata {
    /// Table the upload was ingested into
    #[serde(default)]
    pub table_name: Option<String>,
    /// Original client-side filename
    #[serde(default)]
    pub original_filename: Option<String>,
    /// Rows in the table
    #[serde(default)]
    pub row_count: Option<usize>,
    /// Columns in the table
    #[serde(default)]
    pub column_count: Option<usize>,
}

/// Response body for `GET /database-status`
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseStatusResponse {
    /// Whether the session has an uploaded database
    pub has_database: bool,
    /// Metadata, present only when `has_database` is true
    #[serde(default)]
    pub metadata: Option<DatabaseMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_response_minimal_payload() {
        let json = r#"{"answer": "hello", "session_id": "s1"}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.answer, "hello");
        assert_eq!(resp.session_id, "s1");
        assert!(resp.chart_data.is_none());
        assert!(resp.sql_query.is_none());
        assert!(!resp.requires_approval);
    }

    #[test]
    fn test_chat_response_full_payload() {
        let json = r#"{
            "answer": "here you go",
            "session_id": "s2",
            "chart_data": [{"category": "A", "value": 10.0, "share": 0.5}],
            "chart_type": "bar",
            "sql_query": "SELECT 1",
            "requires_approval": true
        }"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        let points = resp.chart_data.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].category, "A");
        assert_eq!(points[0].value, 10.0);
        assert_eq!(points[0].extra.get("share").unwrap(), &serde_json::json!(0.5));
        assert_eq!(resp.sql_query.as_deref(), Some("SELECT 1"));
        assert!(resp.requires_approval);
    }

    #[test]
    fn test_history_response_tolerates_missing_fields() {
        let json = r#"{"messages": [{"role": "user"}, {"content": "hi"}], "count": 2}"#;
        let resp: HistoryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.messages.len(), 2);
        assert_eq!(resp.messages[0].role, "user");
        assert_eq!(resp.messages[0].content, "");
        assert_eq!(resp.messages[1].role, "");
        assert_eq!(resp.messages[1].content, "hi");
    }

    #[test]
    fn test_history_response_empty_body() {
        let resp: HistoryResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.messages.is_empty());
        assert_eq!(resp.count, 0);
    }

    #[test]
    fn test_execute_response_success_with_rows() {
        let json = r#"{
            "success": true,
            "message": "3 rows",
            "row_count": 3,
            "data": [{"artist": "X", "sales": 42}]
        }"#;
        let resp: ExecuteSqlResponse = serde_json::from_str(json).unwrap();
        assert!(resp.success);
        assert_eq!(resp.row_count, Some(3));
        let rows = resp.data.unwrap();
        assert_eq!(rows[0].get("artist").unwrap(), &serde_json::json!("X"));
    }

    #[test]
    fn test_execute_response_failure() {
        let json = r#"{"success": false, "error": "only SELECT statements are allowed"}"#;
        let resp: ExecuteSqlResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.success);
        assert_eq!(
            resp.error.as_deref(),
            Some("only SELECT statements are allowed")
        );
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_row_preserves_column_order() {
        let json = r#"{"zeta": 1, "alpha": 2, "mid": 3}"#;
        let row: Row = serde_json::from_str(json).unwrap();
        let keys: Vec<&String> = row.keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_chart_kind_from_hint() {
        assert_eq!(ChartKind::from_hint("bar"), ChartKind::Bar);
        assert_eq!(ChartKind::from_hint("LINE"), ChartKind::Line);
        assert_eq!(ChartKind::from_hint("pie"), ChartKind::Pie);
        assert_eq!(
            ChartKind::from_hint("scatter"),
            ChartKind::Other("scatter".to_string())
        );
    }

    #[test]
    fn test_chat_request_serializes_expected_shape() {
        let req = ChatRequest {
            query: "top albums?".to_string(),
            session_id: "s1".to_string(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"query": "top albums?", "session_id": "s1"})
        );
    }

    #[test]
    fn test_database_status_without_metadata() {
        let resp: DatabaseStatusResponse =
            serde_json::from_str(r#"{"has_database": false}"#).unwrap();
        assert!(!resp.has_database);
        assert!(resp.metadata.is_none());
    }
}
