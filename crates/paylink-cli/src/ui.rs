//! Shared terminal output helpers.
//!
//! Uses `colored` for terminal output.

use colored::Colorize;
use paylink_types::activity::{LogEntry, LogLevel};
use paylink_wire::ExchangeOutcome;

/// Print a success message.
pub fn success(msg: &str) {
    println!("  {} {}", "\u{2714}".bright_green(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    println!("  {} {}", "\u{2718}".bright_red(), msg.bright_red());
}

/// Red error + yellow "fix:" suggestion.
pub fn error_with_fix(msg: &str, fix: &str) {
    println!("  {} {}", "\u{2718}".bright_red(), msg.bright_red());
    println!("    {} {}", "fix:".bright_yellow(), fix);
}

/// Section header: ">> Title" in cyan.
pub fn section(title: &str) {
    println!("  {} {}", ">>".bright_cyan().bold(), title.bold());
}

/// Key-value display: "  Label:       value".
pub fn kv(label: &str, value: &str) {
    println!("  {:<13}{}", format!("{label}:"), value);
}

/// Hint line: "  hint: message" in dimmed text.
pub fn hint(msg: &str) {
    println!("  {} {}", "hint:".dimmed(), msg.dimmed());
}

/// Empty line.
pub fn blank() {
    println!();
}

/// Settled payment, colored by result.
pub fn outcome(outcome: &ExchangeOutcome) {
    let label = outcome.label();
    let detail = match outcome.response() {
        Some(r) => r.message.clone(),
        None => outcome.request_id().to_string(),
    };
    if outcome.is_approved() {
        println!("  {} {}", label.bright_green().bold(), detail);
    } else {
        println!("  {} {}", label.bright_red().bold(), detail);
    }
}

/// One activity log line.
pub fn log_entry(entry: &LogEntry) {
    let ts = format!("[{}]", entry.timestamp).dimmed();
    match entry.level {
        LogLevel::Error => println!("  {ts} {}", entry.message.bright_red()),
        LogLevel::Warn => println!("  {ts} {}", entry.message.yellow()),
        LogLevel::Info | LogLevel::Debug => println!("  {ts} {}", entry.message),
    }
}
