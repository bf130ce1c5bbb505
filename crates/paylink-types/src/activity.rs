//! Activity log: the bounded, user-facing log every component writes to.
//!
//! Entries are kept in a ring of [`ACTIVITY_LOG_CAPACITY`] entries, newest
//! first, and each entry is also emitted through `tracing` at the matching
//! level so the process log carries the full history.

use crate::ring::BoundedRing;
use serde::Serialize;

/// Maximum entries retained by the activity log.
pub const ACTIVITY_LOG_CAPACITY: usize = 20;

/// Severity of an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One line in the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Local wall-clock time, `HH:MM:SS`.
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.timestamp, self.message)
    }
}

/// Shared handle to an activity log. Cloning shares the ring.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    source: &'static str,
    ring: BoundedRing<LogEntry>,
}

impl ActivityLog {
    /// New empty log. `source` tags every forwarded `tracing` event.
    pub fn new(source: &'static str) -> Self {
        Self {
            source,
            ring: BoundedRing::new(ACTIVITY_LOG_CAPACITY),
        }
    }

    /// Append an entry at `level`.
    pub fn record(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Debug => tracing::debug!(source = self.source, "{message}"),
            LogLevel::Info => tracing::info!(source = self.source, "{message}"),
            LogLevel::Warn => tracing::warn!(source = self.source, "{message}"),
            LogLevel::Error => tracing::error!(source = self.source, "{message}"),
        }
        self.ring.push(LogEntry {
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
            level,
            message,
        });
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.record(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.record(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.record(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.record(LogLevel::Error, message);
    }

    /// Newest-first snapshot.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.ring.snapshot()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn clear(&self) {
        self.ring.clear();
    }

    /// Whether any retained entry contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.ring.snapshot().iter().any(|e| e.message.contains(needle))
    }
}
