//! Append-only activity console for user-visible operation feedback

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Severity of a console line, mirroring the four line styles of the
/// activity panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug)]
pub struct ConsoleEntry {
    pub timestamp: DateTime<Utc>,
    pub level: ConsoleLevel,
    pub message: String,
}

impl ConsoleEntry {
    /// Render as the `[HH:MM:SS] message` line the panel displays.
    pub fn display_line(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Bounded append-only log of operation outcomes. Oldest entries are
/// dropped on overflow; `clear` resets the panel to its waiting line.
#[derive(Debug)]
pub struct ActivityConsole {
    entries: RwLock<VecDeque<ConsoleEntry>>,
    max_entries: usize,
}

pub const DEFAULT_CONSOLE_BACKLOG: usize = 500;

impl Default for ActivityConsole {
    fn default() -> Self {
        Self::new(DEFAULT_CONSOLE_BACKLOG)
    }
}

impl ActivityConsole {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            max_entries,
        }
    }

    /// Append a line. Console lines mirror to the structured log at a
    /// matching level so operator output and traces stay in step.
    pub async fn log(&self, level: ConsoleLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            ConsoleLevel::Info | ConsoleLevel::Success => info!(console = true, "{}", message),
            ConsoleLevel::Warning => warn!(console = true, "{}", message),
            ConsoleLevel::Error => error!(console = true, "{}", message),
        }

        let mut entries = self.entries.write().await;
        if entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(ConsoleEntry {
            timestamp: Utc::now(),
            level,
            message,
        });
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.log(ConsoleLevel::Info, message).await;
    }

    pub async fn success(&self, message: impl Into<String>) {
        self.log(ConsoleLevel::Success, message).await;
    }

    pub async fn warning(&self, message: impl Into<String>) {
        self.log(ConsoleLevel::Warning, message).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.log(ConsoleLevel::Error, message).await;
    }

    /// Snapshot of the current backlog, oldest first.
    pub async fn entries(&self) -> Vec<ConsoleEntry> {
        self.entries.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_and_snapshot() {
        let console = ActivityConsole::default();
        console.info("Deploying stack \"web\"...").await;
        console.success("Stack \"web\" deployed").await;

        let entries = console.entries().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, ConsoleLevel::Info);
        assert_eq!(entries[1].level, ConsoleLevel::Success);
        assert!(entries[1].display_line().ends_with("Stack \"web\" deployed"));
        assert!(entries[1].display_line().starts_with('['));
    }

    #[tokio::test]
    async fn test_overflow_drops_oldest() {
        let console = ActivityConsole::new(2);
        console.info("first").await;
        console.info("second").await;
        console.info("third").await;

        let entries = console.entries().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "second");
        assert_eq!(entries[1].message, "third");
    }

    #[tokio::test]
    async fn test_clear() {
        let console = ActivityConsole::default();
        console.error("cannot reach the backend").await;
        assert!(!console.is_empty().await);

        console.clear().await;
        assert!(console.is_empty().await);
    }
}
