//! CLI UI utilities for terminal output.
//!
//! Colored status lines, icons and small formatting helpers used by the
//! binary. Nothing here writes to stderr; logs own that stream.

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::models::{SourceReport, SourceStatus, SourceType};

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Icon shown next to a provider name.
pub fn source_icon(source: SourceType) -> &'static str {
    match source {
        SourceType::Scopus => "📚",
        SourceType::OpenAlex => "🔗",
        SourceType::Wos => "🌐",
    }
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Skipped => "○",
        Status::Search => "🔍",
    }
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Skipped,
    Search,
}

impl From<&SourceStatus> for Status {
    fn from(status: &SourceStatus) -> Self {
        match status {
            SourceStatus::Succeeded { .. } => Status::Success,
            SourceStatus::Disabled => Status::Skipped,
            SourceStatus::Failed { .. } => Status::Error,
            SourceStatus::TimedOut => Status::Warning,
        }
    }
}

/// Render a message prefixed with a colored status icon.
pub fn status_line(status: Status, msg: &str) -> String {
    let icon = status_icon(status);
    match status {
        Status::Success => format!("{} {}", icon.green().bold(), msg),
        Status::Error => format!("{} {}", icon.red().bold(), msg),
        Status::Warning => format!("{} {}", icon.yellow().bold(), msg),
        Status::Info => format!("{} {}", icon.cyan().bold(), msg),
        Status::Skipped => format!("{} {}", icon.white().dimmed(), msg),
        Status::Search => format!("{} {}", icon.yellow(), msg),
    }
}

/// Print a styled status message.
pub fn print_status(status: Status, msg: &str) {
    println!("{}", status_line(status, msg));
}

/// Describe one source's part in an aggregate search, without colors.
pub fn describe_report(report: &SourceReport) -> String {
    let name = report.source.name();
    match &report.status {
        SourceStatus::Succeeded { count: 1 } => format!("{}: 1 paper", name),
        SourceStatus::Succeeded { count } => format!("{}: {} papers", name, count),
        SourceStatus::Disabled => format!("{}: disabled", name),
        SourceStatus::Failed { reason } => {
            format!("{}: failed ({})", name, truncate_with_ellipsis(reason, 80))
        }
        SourceStatus::TimedOut => format!("{}: timed out", name),
    }
}

/// Print the per-source status line of an aggregate search.
pub fn print_report(report: &SourceReport) {
    let line = format!("{} {}", source_icon(report.source), describe_report(report));
    print_status(Status::from(&report.status), &line);
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Print search results header.
pub fn print_search_header(query: &str, count: usize, duration: Duration) {
    println!();
    println!(
        "{} Search results for: \"{}\"",
        status_icon(Status::Search).yellow().bold(),
        query.cyan().bold()
    );
    println!(
        "{} Found {} papers in {:.2}s",
        "─".repeat(30).dimmed(),
        format_number(count).green().bold(),
        duration.as_secs_f64()
    );
    println!();
}

/// Format a number with commas.
pub fn format_number(n: usize) -> String {
    n.to_string()
        .chars()
        .rev()
        .collect::<Vec<_>>()
        .chunks(3)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(",")
        .chars()
        .rev()
        .collect()
}

/// Truncate text to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if max_chars <= 3 {
        return "...".to_string();
    }
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_chars - 3).collect();
    format!("{}...", truncated.trim_end())
}
