//! Bounded in-memory buffer of on-screen log lines.

use std::collections::VecDeque;

use chrono::Local;

pub const MAX_LOG_ENTRIES: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: String,
    pub message: String,
}

impl std::fmt::Display for LogLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.timestamp, self.message)
    }
}

#[derive(Debug)]
pub struct LogBuffer {
    entries: VecDeque<LogLine>,
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::with_capacity(MAX_LOG_ENTRIES)
    }
}

impl LogBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogLine {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            message: message.into(),
        });
    }

    /// The last `limit` lines, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<LogLine> {
        let safe_limit = limit.clamp(1, self.capacity);
        let skip = self.entries.len().saturating_sub(safe_limit);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn all(&self) -> Vec<LogLine> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) -> usize {
        let cleared = self.entries.len();
        self.entries.clear();
        cleared
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
