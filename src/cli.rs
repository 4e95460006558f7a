//! Command-line interface definition for Tabletalk
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, file upload, and session
//! database management.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tabletalk - conversational CLI for a natural-language-to-SQL agent
///
/// Ask questions about your data in plain language; review and approve
/// any SQL the agent proposes before it runs.
#[derive(Parser, Debug, Clone)]
#[command(name = "tabletalk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the agent backend base URL from config
    #[arg(long, env = "TABLETALK_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Tabletalk
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session with the agent
    Chat {
        /// Start from a fresh session instead of resuming the stored one
        #[arg(long)]
        fresh: bool,
    },

    /// Upload a CSV or Excel file as the session's database
    Upload {
        /// Path to the .csv, .xlsx or .xls file
        file: PathBuf,
    },

    /// Show the status of the session's uploaded database
    Status,

    /// Delete the session's uploaded database on the server
    ResetDb,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
