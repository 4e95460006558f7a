//! Error types for Tabletalk
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Tabletalk operations
///
/// This enum encompasses all possible errors that can occur while talking
/// to the agent backend, managing session identity, exporting tabular
/// data, and loading configuration.
#[derive(Error, Debug)]
pub enum TabletalkError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend-related errors (agent API calls, non-success statuses)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Session identity/storage errors
    #[error("Session error: {0}")]
    Session(String),

    /// History hydration errors
    #[error("History error: {0}")]
    History(String),

    /// SQL execution errors reported by the backend
    #[error("Execution error: {0}")]
    Execution(String),

    /// Upload validation or transfer errors
    #[error("Upload error: {0}")]
    Upload(String),

    /// Tabular export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Clipboard access errors
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV encoding errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for Tabletalk operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
