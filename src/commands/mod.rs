/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes two top-level command modules:

- `chat` — Interactive chat loop with the agent, including the approval
  flow for proposed SQL
- `db`   — Upload, status, and delete handlers for the session database

These handlers are intentionally small and use the library components:
the backend transport, the turn controller, and the egress encoders.
*/

use crate::backend::{ChartPoint, Row};
use crate::conversation::ChatMessage;
use crate::error::{Result, TabletalkError};

// Special commands parser for the chat loop
pub mod special;

/// Allowed upload extensions, matching what the server ingests
const ALLOWED_UPLOAD_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// Validate an upload path and return its file name
///
/// Rejects unsupported extensions client-side so the user gets a clear
/// message before any bytes are sent.
pub fn validate_upload_path(path: &std::path::Path) -> Result<String> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| TabletalkError::Upload("File name could not be determined".to_string()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if !ALLOWED_UPLOAD_EXTENSIONS.contains(&extension.as_str()) {
        return Err(TabletalkError::Upload(format!(
            "Unsupported file format '{}'. Allowed formats: {}",
            file_name,
            ALLOWED_UPLOAD_EXTENSIONS.join(", ")
        ))
        .into());
    }

    Ok(file_name.to_string())
}

/// Convert chart points into exportable rows
///
/// Category and value become columns; extra fields pass through.
fn chart_points_to_rows(points: &[ChartPoint]) -> Vec<Row> {
    points
        .iter()
        .map(|p| {
            let mut row = Row::new();
            row.insert("category".to_string(), serde_json::json!(p.category));
            row.insert("value".to_string(), serde_json::json!(p.value));
            for (key, value) in &p.extra {
                row.insert(key.clone(), value.clone());
            }
            row
        })
        .collect()
}

/// The most recent tabular payload in the log, if any
///
/// Result rows win over chart data; chart points are converted so they
/// stay exportable too.
pub fn latest_rows(messages: &[ChatMessage]) -> Option<Vec<Row>> {
    for message in messages.iter().rev() {
        if let Some(rows) = &message.rows {
            if !rows.is_empty() {
                return Some(rows.clone());
            }
        }
        if let Some(chart) = &message.chart {
            if !chart.points.is_empty() {
                return Some(chart_points_to_rows(&chart.points));
            }
        }
    }
    None
}

/// Interactive chat command handler
pub mod chat {
    //! Interactive chat loop.
    //!
    //! Hydrates the conversation from server-side history, then runs a
    //! readline loop that submits user input to the agent and walks the
    //! approval flow whenever a turn carries a pending SQL proposal.

    use super::*;
    use crate::approval::{ApprovalGate, ApprovalState};
    use crate::backend::{AgentBackend, HttpBackend};
    use crate::commands::special::{parse_special_command, print_help, ExportFormat, SpecialCommand};
    use crate::config::Config;
    use crate::conversation::TurnController;
    use crate::egress;
    use crate::render;
    use crate::session::SessionManager;

    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::sync::Arc;

    /// Start the interactive chat loop
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `fresh` - If true, rotate the session before starting instead of
    ///   resuming the stored one
    pub async fn run_chat(config: Config, fresh: bool) -> Result<()> {
        tracing::info!("Starting interactive chat");

        let backend: Arc<dyn AgentBackend> = Arc::new(HttpBackend::new(config.backend.clone())?);
        let sessions = SessionManager::from_default_store();
        if fresh {
            sessions.reset()?;
        }

        let controller =
            TurnController::new(backend.clone(), sessions, config.chat.greeting.clone())?;
        controller.hydrate().await;

        let preview_rows = config.chat.result_preview_rows;

        print_welcome_banner(&controller.session());
        for message in controller.messages() {
            println!("{}", render::render_message(&message, preview_rows));
        }

        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline(">> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    match parse_special_command(trimmed) {
                        SpecialCommand::Help => {
                            print_help();
                            continue;
                        }
                        SpecialCommand::Status => {
                            show_status(backend.as_ref(), &controller).await;
                            continue;
                        }
                        SpecialCommand::Reset => {
                            controller.reset()?;
                            println!("{}\n", "Conversation reset. New session started.".green());
                            for message in controller.messages() {
                                println!("{}", render::render_message(&message, preview_rows));
                            }
                            continue;
                        }
                        SpecialCommand::Export { format, path } => {
                            handle_export(&controller, format, path.as_deref());
                            continue;
                        }
                        SpecialCommand::Copy => {
                            handle_copy(&controller);
                            continue;
                        }
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {}
                    }

                    rl.add_history_entry(trimmed)?;

                    let before = controller.log_len();
                    println!("{}", "thinking...".dimmed());
                    controller.submit(trimmed).await?;

                    let messages = controller.messages();
                    for message in messages.iter().skip(before) {
                        println!("{}", render::render_message(message, preview_rows));
                    }

                    // Walk the approval flow when the turn proposed SQL
                    let pending = messages
                        .last()
                        .filter(|m| m.has_pending_sql())
                        .and_then(|m| m.proposed_sql.clone());
                    if let Some(sql) = pending {
                        run_approval_flow(&mut rl, backend.as_ref(), &controller, &sql).await?;

                        let before_gate = controller.log_len();
                        controller.drain_gate_outcomes();
                        for message in controller.messages().iter().skip(before_gate) {
                            println!("{}", render::render_message(message, preview_rows));
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Walk the user through approving, editing, or skipping proposed SQL
    async fn run_approval_flow(
        rl: &mut DefaultEditor,
        backend: &dyn AgentBackend,
        controller: &TurnController,
        proposed_sql: &str,
    ) -> Result<()> {
        let mut gate = ApprovalGate::new(proposed_sql, controller.gate_sender());

        loop {
            println!("{}", render::render_approval_panel(gate.working_sql()));

            let choice = match rl.readline("[r]un, [e]dit, [c]opy, [s]kip >> ") {
                Ok(line) => line.trim().to_lowercase(),
                Err(_) => return Ok(()),
            };

            match choice.as_str() {
                "r" | "run" => {
                    println!("{}", "executing...".dimmed());
                    gate.execute(backend, &controller.session()).await?;

                    match gate.state() {
                        ApprovalState::Resolved(outcome) if outcome.success => {
                            println!("{}\n", outcome.detail.green());
                            return Ok(());
                        }
                        ApprovalState::Resolved(outcome) => {
                            // Failure stays scoped to this panel; the user
                            // may edit and retry or skip.
                            println!("{}\n", outcome.detail.red());
                        }
                        _ => {}
                    }
                }
                "e" | "edit" => {
                    gate.toggle_editing();
                    let initial = gate.working_sql().to_string();
                    match rl.readline_with_initial("sql >> ", (&initial, "")) {
                        Ok(edited) => {
                            gate.edit(edited.trim().to_string());
                        }
                        Err(_) => {}
                    }
                    gate.toggle_editing();
                }
                "c" | "copy" => match egress::copy_text_to_clipboard(gate.working_sql()) {
                    Ok(()) => println!("{}", "SQL copied to clipboard.".green()),
                    Err(e) => println!("{}", format!("Copy failed: {}", e).yellow()),
                },
                "s" | "skip" | "" => return Ok(()),
                other => println!("{}", format!("Unknown choice: {}", other).yellow()),
            }
        }
    }

    /// Export the latest tabular result to a file
    fn handle_export(controller: &TurnController, format: ExportFormat, path: Option<&str>) {
        let rows = latest_rows(&controller.messages()).unwrap_or_default();
        let path = path.unwrap_or_else(|| format.default_file_name());

        let written = match format {
            ExportFormat::Csv => egress::export_csv(&rows, path),
            ExportFormat::Xlsx => egress::export_workbook(&rows, path),
            ExportFormat::Json => egress::export_json(&rows, path),
        };

        match written {
            Ok(true) => println!("{}", format!("Exported to {}", path).green()),
            Ok(false) => println!("{}", "No tabular data to export yet.".yellow()),
            Err(e) => println!("{}", format!("Export failed: {}", e).red()),
        }
    }

    /// Copy the latest tabular result to the clipboard
    fn handle_copy(controller: &TurnController) {
        let rows = latest_rows(&controller.messages()).unwrap_or_default();
        match egress::copy_to_clipboard(&rows) {
            Ok(true) => println!("{}", "Result copied to clipboard.".green()),
            Ok(false) => println!("{}", "No tabular data to copy yet.".yellow()),
            Err(e) => println!("{}", format!("Copy failed: {}", e).yellow()),
        }
    }

    /// Display session and database status
    async fn show_status(backend: &dyn AgentBackend, controller: &TurnController) {
        println!("\nSession:  {}", controller.session().cyan());
        println!("Messages: {}", controller.log_len());

        match backend.database_status(&controller.session()).await {
            Ok(status) if status.has_database => {
                let meta = status.metadata.unwrap_or_else(|| {
                    crate::backend::DatabaseMetadata {
                        table_name: None,
                        original_filename: None,
                        row_count: None,
                        column_count: None,
                    }
                });
                println!("Database: {}", "uploaded".green());
                if let Some(name) = meta.original_filename {
                    println!("  file:    {}", name);
                }
                if let Some(table) = meta.table_name {
                    println!("  table:   {}", table);
                }
                if let (Some(rows), Some(cols)) = (meta.row_count, meta.column_count) {
                    println!("  size:    {} rows x {} columns", rows, cols);
                }
            }
            Ok(_) => println!("Database: {}", "none uploaded".yellow()),
            Err(e) => println!("Database: {}", format!("status unavailable ({})", e).yellow()),
        }
        println!();
    }

    /// Display welcome banner at the start of the chat loop
    fn print_welcome_banner(session: &str) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                  Tabletalk - SQL Data Analyst                ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        if session.is_empty() {
            println!("Session: {} (no persistent storage)\n", "degraded".yellow());
        } else {
            println!("Session: {}\n", session.cyan());
        }
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }
}

/// Database management command handlers
pub mod db {
    //! Upload, status, and delete handlers for the session database.

    use super::*;
    use crate::backend::{AgentBackend, HttpBackend, UploadResponse};
    use crate::config::Config;
    use crate::session::SessionManager;

    use colored::Colorize;
    use std::path::Path;

    /// Upload a tabular file as the session's database
    pub async fn run_upload(config: Config, file: std::path::PathBuf) -> Result<()> {
        let backend = HttpBackend::new(config.backend.clone())?;
        let session = SessionManager::from_default_store().get_or_create()?;

        let response = upload(&backend, &session, &file).await?;

        println!("{}", response.message.green());
        if let Some(table) = &response.table_name {
            println!("Table: {}", table);
        }
        if let (Some(rows), Some(cols)) = (response.row_count, response.column_count) {
            println!("Ingested {} rows x {} columns", rows, cols);
        }
        Ok(())
    }

    /// Validate, read, and send one file to the backend
    pub async fn upload(
        backend: &dyn AgentBackend,
        session: &str,
        file: &Path,
    ) -> Result<UploadResponse> {
        let file_name = validate_upload_path(file)?;
        let bytes = std::fs::read(file)
            .map_err(|e| TabletalkError::Upload(format!("Failed to read {:?}: {}", file, e)))?;

        tracing::info!("Uploading {} ({} bytes)", file_name, bytes.len());
        backend.upload_file(&file_name, bytes, session).await
    }

    /// Show the status of the session's uploaded database
    pub async fn run_status(config: Config) -> Result<()> {
        let backend = HttpBackend::new(config.backend.clone())?;
        let session = SessionManager::from_default_store().get_or_create()?;

        let status = backend.database_status(&session).await?;
        if status.has_database {
            println!("{}", "Database uploaded.".green());
            if let Some(meta) = status.metadata {
                if let Some(name) = meta.original_filename {
                    println!("File:  {}", name);
                }
                if let Some(table) = meta.table_name {
                    println!("Table: {}", table);
                }
                if let (Some(rows), Some(cols)) = (meta.row_count, meta.column_count) {
                    println!("Size:  {} rows x {} columns", rows, cols);
                }
            }
        } else {
            println!(
                "{}",
                "No database uploaded for this session. Use 'tabletalk upload <file>'.".yellow()
            );
        }
        Ok(())
    }

    /// Delete the session's uploaded database
    pub async fn run_reset_db(config: Config) -> Result<()> {
        let backend = HttpBackend::new(config.backend.clone())?;
        let session = SessionManager::from_default_store().get_or_create()?;

        backend.delete_database(&session).await?;
        println!("{}", "Database deleted.".green());
        Ok(())
    }
}
