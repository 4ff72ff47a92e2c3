//! Real-time pipeline log streaming via Server-Sent Events (SSE).
//!
//! A broadcast channel carries structured log entries to any connected
//! SSE client; entries are also echoed to stdout so CLI runs narrate the
//! same way the server does.

use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Log level for display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn prefix(self) -> &'static str {
        match self {
            LogLevel::Info => "     ",
            LogLevel::Success => "   ok",
            LogLevel::Warning => " warn",
            LogLevel::Error => "  err",
        }
    }
}

/// A single log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// RFC 3339 emission time.
    pub at: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into(), at: Utc::now().to_rfc3339() }
    }
}

/// Global log broadcaster.
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Broadcasts log entries to all connected SSE clients.
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a log entry to all subscribers and echo it to stdout.
    pub fn log(&self, entry: LogEntry) {
        println!("{} {}", entry.level.prefix(), entry.message);
        // Ignore the send error when no SSE client is listening.
        let _ = self.sender.send(entry);
    }

    /// Get a receiver for SSE streaming.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Success, msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Warning, msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Error, msg));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_entries() {
        let broadcaster = LogBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.log(LogEntry::new(LogLevel::Success, "parsed 3 rows"));

        let entry = rx.recv().await.unwrap();
        assert_eq!(entry.level, LogLevel::Success);
        assert_eq!(entry.message, "parsed 3 rows");
    }

    #[test]
    fn test_log_without_subscribers_does_not_panic() {
        let broadcaster = LogBroadcaster::new();
        broadcaster.log(LogEntry::new(LogLevel::Info, "nobody listening"));
    }
}
