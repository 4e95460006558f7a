//! Special command parser for the chat loop
//!
//! Lines starting with `/` (plus the bare `exit`/`quit`) are handled by
//! the client instead of being submitted to the agent.

use colored::Colorize;

/// Export formats available from the chat loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Json,
}

impl ExportFormat {
    /// Parse a format name
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }

    /// Default file name for this format
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Self::Csv => "tabletalk-export.csv",
            Self::Xlsx => "tabletalk-export.xlsx",
            Self::Json => "tabletalk-export.json",
        }
    }
}

/// A parsed special command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Show help text
    Help,
    /// Show session and database status
    Status,
    /// Reset the conversation and rotate the session
    Reset,
    /// Export the latest tabular result to a file
    Export {
        format: ExportFormat,
        path: Option<String>,
    },
    /// Copy the latest tabular result to the clipboard
    Copy,
    /// Leave the chat loop
    Exit,
    /// Not a special command; submit to the agent
    None,
}

/// Parse one input line into a special command
///
/// # Examples
///
/// ```
/// use tabletalk::commands::special::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/help"), SpecialCommand::Help);
/// assert_eq!(parse_special_command("show me sales"), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> SpecialCommand {
    let trimmed = input.trim();

    match trimmed.to_lowercase().as_str() {
        "exit" | "quit" | "/exit" | "/quit" => return SpecialCommand::Exit,
        "/help" => return SpecialCommand::Help,
        "/status" => return SpecialCommand::Status,
        "/reset" => return SpecialCommand::Reset,
        "/copy" => return SpecialCommand::Copy,
        _ => {}
    }

    if let Some(rest) = trimmed.strip_prefix("/export") {
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return SpecialCommand::None;
        }
        let mut parts = rest.split_whitespace();
        let format = match parts.next() {
            Some(name) => match ExportFormat::parse_str(name) {
                Ok(format) => format,
                Err(e) => {
                    println!("{}", e.yellow());
                    return SpecialCommand::Help;
                }
            },
            None => ExportFormat::Csv,
        };
        let path = parts.next().map(str::to_string);
        return SpecialCommand::Export { format, path };
    }

    SpecialCommand::None
}

/// Print help for the chat loop
pub fn print_help() {
    println!("\nCommands:");
    println!("  {}            show this help", "/help".cyan());
    println!("  {}          session and database status", "/status".cyan());
    println!(
        "  {}           reset the conversation and start a new session",
        "/reset".cyan()
    );
    println!(
        "  {}  export the latest result (csv, xlsx or json)",
        "/export <fmt> [path]".cyan()
    );
    println!(
        "  {}            copy the latest result to the clipboard",
        "/copy".cyan()
    );
    println!("  {}             leave the chat", "exit".cyan());
    println!();
    println!("Anything else is sent to the agent as a question about your data.");
    println!();
}
