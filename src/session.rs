//! Session identity management
//!
//! The agent backend scopes conversation history and uploaded databases
//! by an opaque session token held client-side. This module owns that
//! token: lazy creation, persistence under one fixed key file, and
//! explicit reset. The store is an injected dependency so the turn
//! controller and hydrator can be tested with an in-memory fake.

use crate::error::{Result, TabletalkError};
use directories::ProjectDirs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Name of the single file holding the persisted session token
const SESSION_KEY_FILE: &str = "session-token";

/// Storage interface for the persisted session token
///
/// Implementations provide plain get/set/clear semantics over a single
/// namespaced key. No network access is permitted at this boundary.
pub trait SessionStore: Send + Sync {
    /// Return the persisted token, if any
    fn get(&self) -> Option<String>;

    /// Persist a token, replacing any previous value
    fn set(&self, token: &str) -> Result<()>;

    /// Remove the persisted token
    fn clear(&self) -> Result<()>;
}

/// File-backed session store under the user's data directory
///
/// The token lives in a single file so that subsequent invocations of the
/// CLI resume the same server-side session. Two concurrent processes may
/// both create a token; the last writer wins (accepted limitation, no
/// locking).
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Create a store at the default location
    ///
    /// Honors a `TABLETALK_SESSION_FILE` environment override so tests
    /// and scripts can point the client at an alternate token file.
    ///
    /// # Errors
    ///
    /// Returns a `Session` error when no user data directory can be
    /// resolved (e.g. minimal containers without a home directory).
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("TABLETALK_SESSION_FILE") {
            return Ok(Self {
                path: PathBuf::from(override_path),
            });
        }

        let proj_dirs = ProjectDirs::from("com", "tabletalk", "tabletalk")
            .ok_or_else(|| TabletalkError::Session("Could not determine data directory".into()))?;

        Ok(Self {
            path: proj_dirs.data_dir().join(SESSION_KEY_FILE),
        })
    }

    /// Create a store backed by an explicit file path
    ///
    /// # Examples
    ///
    /// ```
    /// use tabletalk::session::FileSessionStore;
    ///
    /// let store = FileSessionStore::with_path("/tmp/tabletalk-session");
    /// ```
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim().to_string();
                if token.is_empty() {
                    None
                } else {
                    Some(token)
                }
            }
            Err(_) => None,
        }
    }

    fn set(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TabletalkError::Session(format!("Failed to create data directory: {}", e))
            })?;
        }
        std::fs::write(&self.path, token)
            .map_err(|e| TabletalkError::Session(format!("Failed to persist token: {}", e)))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(TabletalkError::Session(format!("Failed to clear token: {}", e)).into())
            }
        }
    }
}

/// In-memory session store for tests and fakes
#[derive(Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<String>>,
}

impl MemorySessionStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// Manages the one active session token for this client instance
///
/// All backend calls after acquisition use the same token until an
/// explicit [`SessionManager::reset`]. When no store is available the
/// manager degrades to a sentinel empty session so the chat still
/// functions without persistence.
#[derive(Clone)]
pub struct SessionManager {
    store: Option<Arc<dyn SessionStore>>,
}

impl SessionManager {
    /// Create a manager over an explicit store
    pub fn with_store(store: Arc<dyn SessionStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Create a manager with no persistence (sentinel empty session)
    pub fn degraded() -> Self {
        Self { store: None }
    }

    /// Create a manager over the default file store, degrading on failure
    ///
    /// Storage unavailability is logged and never surfaced: the client
    /// must stay usable in a session-less mode.
    pub fn from_default_store() -> Self {
        match FileSessionStore::new() {
            Ok(store) => Self::with_store(Arc::new(store)),
            Err(e) => {
                tracing::warn!("Session storage unavailable, degrading: {}", e);
                Self::degraded()
            }
        }
    }

    /// Return the persisted token, creating and persisting one if absent
    ///
    /// Idempotent with respect to already-persisted state: repeated calls
    /// return the same token until [`SessionManager::reset`] is called.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use tabletalk::session::{MemorySessionStore, SessionManager};
    ///
    /// let manager = SessionManager::with_store(Arc::new(MemorySessionStore::new()));
    /// let first = manager.get_or_create().unwrap();
    /// let second = manager.get_or_create().unwrap();
    /// assert_eq!(first, second);
    /// ```
    pub fn get_or_create(&self) -> Result<String> {
        let Some(store) = &self.store else {
            return Ok(String::new());
        };

        if let Some(token) = store.get() {
            return Ok(token);
        }

        let token = generate_token();
        store.set(&token)?;
        tracing::debug!("Created new session token");
        Ok(token)
    }

    /// Clear the persisted token
    ///
    /// Does not create a replacement; the next [`SessionManager::get_or_create`]
    /// performs creation. The old token must not be reused by the client
    /// afterwards.
    pub fn reset(&self) -> Result<()> {
        if let Some(store) = &self.store {
            store.clear()?;
        }
        Ok(())
    }

    /// Persist a server-rotated token as the active session
    ///
    /// The backend may answer a turn with a different session token; the
    /// returned token becomes the one used for all subsequent calls.
    pub fn adopt(&self, token: &str) -> Result<()> {
        if let Some(store) = &self.store {
            store.set(token)?;
        }
        Ok(())
    }
}

/// Generate a collision-resistant session token
///
/// Millisecond timestamp plus a random hex suffix, so two processes of
/// the same client racing on creation still mint distinct tokens.
fn generate_token() -> String {
    use rand::RngCore as _;

    let millis = chrono::Utc::now().timestamp_millis();
    let mut bytes = [0u8; 4];
    rand::rng().fill_bytes(&mut bytes);
    format!("{}-{:08x}", millis, u32::from_be_bytes(bytes))
}
