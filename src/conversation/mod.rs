//! Conversation log and message model
//!
//! The conversation log is the single source of truth for what is
//! rendered: an ordered, append-only sequence of messages. The only
//! non-append mutation is an explicit reset back to the seeded greeting.
//!
//! Approval outcomes never mutate past messages; a resolved execution
//! re-enters the log as a new appended turn.

pub mod hydrate;
pub mod turn;

pub use turn::{SubmitOutcome, TurnController};

use crate::backend::{ChartPayload, Row};

/// Role of a message author
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Parse a role string from the server, tolerating unknown values
    ///
    /// Anything that is not "user" is treated as assistant output, so a
    /// historical turn with an odd role still renders instead of failing
    /// hydration.
    pub fn from_wire(s: &str) -> Self {
        if s.eq_ignore_ascii_case("user") {
            Self::User
        } else {
            Self::Assistant
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single turn in the conversation
///
/// Assistant messages may additionally carry a chart payload, a tabular
/// result set, or a pending SQL proposal awaiting approval.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Stable identity within the log (millisecond timestamp + random suffix)
    pub id: String,
    /// Author of the turn
    pub role: Role,
    /// Markdown-formatted message text
    pub content: String,
    /// Optional chart payload for rendering
    pub chart: Option<ChartPayload>,
    /// Optional tabular result rows (source for exports)
    pub rows: Option<Vec<Row>>,
    /// SQL the agent proposes to run, if any
    pub proposed_sql: Option<String>,
    /// Whether the proposal awaits user approval
    pub requires_approval: bool,
}

impl ChatMessage {
    /// Create a user message
    ///
    /// # Examples
    ///
    /// ```
    /// use tabletalk::conversation::{ChatMessage, Role};
    ///
    /// let msg = ChatMessage::user("How many rows?");
    /// assert_eq!(msg.role, Role::User);
    /// assert!(!msg.requires_approval);
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: next_message_id(),
            role: Role::User,
            content: content.into(),
            chart: None,
            rows: None,
            proposed_sql: None,
            requires_approval: false,
        }
    }

    /// Create a plain assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: next_message_id(),
            role: Role::Assistant,
            content: content.into(),
            chart: None,
            rows: None,
            proposed_sql: None,
            requires_approval: false,
        }
    }

    /// Attach a chart payload
    pub fn with_chart(mut self, chart: ChartPayload) -> Self {
        self.chart = Some(chart);
        self
    }

    /// Attach tabular result rows
    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Attach a SQL proposal
    ///
    /// The approval flag is honored only for a non-blank statement, so
    /// `requires_approval` always implies a usable proposal.
    pub fn with_proposal(mut self, sql: impl Into<String>, requires_approval: bool) -> Self {
        let sql = sql.into();
        if sql.trim().is_empty() {
            self.proposed_sql = None;
            self.requires_approval = false;
        } else {
            self.requires_approval = requires_approval;
            self.proposed_sql = Some(sql);
        }
        self
    }

    /// Whether this message carries a proposal awaiting approval
    pub fn has_pending_sql(&self) -> bool {
        self.requires_approval && self.proposed_sql.is_some()
    }
}

/// Generate a message id: millisecond timestamp plus random suffix
///
/// Monotonic enough for stable list identity; collisions across
/// concurrent appends are prevented by the random suffix.
fn next_message_id() -> String {
    use rand::RngCore as _;

    let millis = chrono::Utc::now().timestamp_millis();
    let mut bytes = [0u8; 2];
    rand::rng().fill_bytes(&mut bytes);
    format!("{}-{:04x}", millis, u16::from_be_bytes(bytes))
}

/// Ordered, append-only conversation log
///
/// Insertion order is chronological order is render order. A fresh or
/// reset log contains exactly one seeded assistant greeting.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    greeting: String,
    messages: Vec<ChatMessage>,
}

impl ConversationLog {
    /// Create a log seeded with the greeting message
    ///
    /// # Examples
    ///
    /// ```
    /// use tabletalk::conversation::ConversationLog;
    ///
    /// let log = ConversationLog::new("Hello!");
    /// assert_eq!(log.len(), 1);
    /// assert_eq!(log.messages()[0].content, "Hello!");
    /// ```
    pub fn new(greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        let seed = ChatMessage::assistant(greeting.clone());
        Self {
            greeting,
            messages: vec![seed],
        }
    }

    /// Append a message to the end of the log
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Replace the log contents with hydrated history
    ///
    /// Used once at session acquisition. An empty history leaves the
    /// seeded greeting in place.
    pub fn hydrate(&mut self, history: Vec<ChatMessage>) {
        if !history.is_empty() {
            self.messages = history;
        }
    }

    /// Reset the log to the single seeded greeting
    pub fn reset(&mut self) {
        self.messages = vec![ChatMessage::assistant(self.greeting.clone())];
    }

    /// All messages, in render order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages in the log
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when the log holds no messages (only before seeding)
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recent message
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}
