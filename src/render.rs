//! Terminal rendering of conversation content
//!
//! Pure formatting helpers that turn messages, result rows, and chart
//! payloads into strings for the chat loop to print. Kept free of I/O so
//! the output shapes are testable.

use crate::backend::{ChartKind, ChartPayload, Row};
use crate::conversation::{ChatMessage, Role};

use colored::Colorize;
use prettytable::{format, Table};

/// Width of the value bar in text chart rendering
const CHART_BAR_WIDTH: usize = 30;

/// Render result rows as a bordered table, previewing at most `limit` rows
pub fn render_rows(rows: &[Row], limit: usize) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::Row::new(
        columns
            .iter()
            .map(|c| prettytable::Cell::new(c))
            .collect(),
    ));

    for row in rows.iter().take(limit) {
        let cells = columns
            .iter()
            .map(|c| {
                let text = match row.get(c) {
                    None | Some(serde_json::Value::Null) => String::new(),
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                };
                prettytable::Cell::new(&text)
            })
            .collect();
        table.add_row(prettytable::Row::new(cells));
    }

    let mut rendered = table.to_string();
    if rows.len() > limit {
        rendered.push_str(&format!("... {} more row(s)\n", rows.len() - limit));
    }
    rendered
}

/// Render a chart payload as text
///
/// Bar-shaped charts get a proportional bar per category; other shapes
/// fall back to a category/value listing.
pub fn render_chart(chart: &ChartPayload) -> String {
    if chart.points.is_empty() {
        return String::new();
    }

    let mut out = format!("[{} chart]\n", chart.kind);
    let max_value = chart
        .points
        .iter()
        .map(|p| p.value.abs())
        .fold(0.0_f64, f64::max);
    let label_width = chart
        .points
        .iter()
        .map(|p| p.category.chars().count())
        .max()
        .unwrap_or(0);

    for point in &chart.points {
        if chart.kind == ChartKind::Bar && max_value > 0.0 {
            let filled = ((point.value.abs() / max_value) * CHART_BAR_WIDTH as f64).round() as usize;
            out.push_str(&format!(
                "{:<width$}  {} {}\n",
                point.category,
                "#".repeat(filled),
                point.value,
                width = label_width
            ));
        } else {
            out.push_str(&format!(
                "{:<width$}  {}\n",
                point.category,
                point.value,
                width = label_width
            ));
        }
    }
    out
}

/// Render one conversation message for the terminal
///
/// `preview_rows` bounds how many result rows are shown inline.
pub fn render_message(message: &ChatMessage, preview_rows: usize) -> String {
    let prefix = match message.role {
        Role::User => "you".cyan().bold().to_string(),
        Role::Assistant => "analyst".green().bold().to_string(),
    };

    let mut out = format!("{} {}\n", prefix, message.content);

    if let Some(chart) = &message.chart {
        out.push('\n');
        out.push_str(&render_chart(chart));
    }

    if let Some(rows) = &message.rows {
        if !rows.is_empty() {
            out.push('\n');
            out.push_str(&render_rows(rows, preview_rows));
        }
    }

    if message.has_pending_sql() {
        out.push('\n');
        out.push_str(
            &"The agent proposed a SQL query that needs your approval."
                .yellow()
                .to_string(),
        );
        out.push('\n');
    }

    out
}

/// Render the approval panel around a proposed statement
pub fn render_approval_panel(sql: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "--- SQL query proposed ---".blue().bold()));
    out.push_str(&format!("{}\n", sql.trim()));
    out.push_str(&format!("{}\n", "--------------------------".blue()));
    out.push_str(&format!(
        "{}\n",
        "Only SELECT statements are accepted by the server; data-modifying \
         statements are rejected."
            .dimmed()
    ));
    out
}
