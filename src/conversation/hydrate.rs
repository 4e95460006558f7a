//! History hydration
//!
//! Populates the local conversation log from the server-side history of
//! a session. This boundary swallows failures deliberately: a dead or
//! misbehaving history endpoint must never block the chat from becoming
//! usable, so any error degrades to "no history" and is only logged.

use crate::backend::AgentBackend;
use crate::conversation::{ChatMessage, Role};

/// Load prior turns for a session
///
/// Returns `Some` with the hydrated messages in server-provided order
/// when the session has history, `None` when it has none or the request
/// failed. Chart and SQL metadata on historical turns is best-effort and
/// may be absent; only role and content are reconstructed.
pub async fn load(backend: &dyn AgentBackend, session: &str) -> Option<Vec<ChatMessage>> {
    match backend.load_history(session).await {
        Ok(resp) => {
            if resp.messages.is_empty() {
                tracing::debug!("No server-side history for this session");
                return None;
            }

            tracing::debug!("Hydrating {} historical turns", resp.messages.len());
            let messages = resp
                .messages
                .into_iter()
                .map(|m| match Role::from_wire(&m.role) {
                    Role::User => ChatMessage::user(m.content),
                    Role::Assistant => ChatMessage::assistant(m.content),
                })
                .collect();
            Some(messages)
        }
        Err(e) => {
            tracing::warn!("History hydration failed, starting fresh: {}", e);
            None
        }
    }
}
