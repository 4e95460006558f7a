//! Tabletalk - conversational CLI for a natural-language-to-SQL agent
//!
//! This library provides the client-side core of Tabletalk: session
//! identity, conversation state, the approval flow for agent-proposed
//! SQL, the backend transport, and tabular export.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Session token storage and lifecycle
//! - `conversation`: Conversation log, history hydration, and the turn controller
//! - `approval`: Per-message approval gate for proposed SQL
//! - `backend`: Agent backend trait, wire types, and HTTP implementation
//! - `egress`: Tabular export encoders (CSV, XLSX, JSON, clipboard)
//! - `render`: Terminal rendering helpers
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tabletalk::backend::HttpBackend;
//! use tabletalk::config::Config;
//! use tabletalk::conversation::TurnController;
//! use tabletalk::session::SessionManager;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let backend = Arc::new(HttpBackend::new(config.backend.clone())?);
//!     let sessions = SessionManager::from_default_store();
//!
//!     let controller = TurnController::new(backend, sessions, config.chat.greeting.clone())?;
//!     controller.hydrate().await;
//!     controller.submit("How many rows does my data have?").await?;
//!     Ok(())
//! }
//! ```

pub mod approval;
pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod egress;
pub mod error;
pub mod render;
pub mod session;

// Re-export commonly used types
pub use approval::{ApprovalGate, ApprovalState};
pub use backend::{AgentBackend, HttpBackend};
pub use config::Config;
pub use conversation::{ChatMessage, ConversationLog, Role, SubmitOutcome, TurnController};
pub use error::{Result, TabletalkError};
pub use session::{SessionManager, SessionStore};

#[cfg(test)]
pub mod test_utils;
