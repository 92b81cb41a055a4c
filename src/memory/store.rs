//! Bounded conversation log storage
//!
//! Fixed-capacity, insertion-ordered log of (role, content) entries.
//! The oldest entry is evicted once capacity is exceeded.

use crate::error::PipelineError;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Capacity used when an agent does not configure one
pub const DEFAULT_MEMORY_CAPACITY: usize = 6;

/// Role of a log entry author
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Agent,
    Tool,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Agent => "agent",
            MessageRole::Tool => "tool",
        };
        write!(f, "{}", s)
    }
}

/// A single entry in a conversation log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Fixed-capacity FIFO log owned by a single agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawLog")]
pub struct ConversationLog {
    capacity: usize,
    entries: VecDeque<LogEntry>,
}

/// Serialized form; rebuilt through `ConversationLog::new`
#[derive(Deserialize)]
struct RawLog {
    capacity: usize,
    #[serde(default)]
    entries: VecDeque<LogEntry>,
}

impl TryFrom<RawLog> for ConversationLog {
    type Error = PipelineError;

    /// Only the newest `capacity` entries survive
    fn try_from(raw: RawLog) -> Result<Self> {
        let mut log = Self::new(raw.capacity)?;
        let skip = raw.entries.len().saturating_sub(log.capacity);
        log.entries.extend(raw.entries.into_iter().skip(skip));
        Ok(log)
    }
}

impl ConversationLog {
    /// Create a log holding at most `capacity` entries.
    ///
    /// A capacity of zero is rejected.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PipelineError::InvalidCapacity(capacity));
        }

        Ok(Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        })
    }

    /// Append an entry at the tail, evicting from the head past capacity
    pub fn append(&mut self, role: MessageRole, content: impl Into<String>) {
        self.entries.push_back(LogEntry::new(role, content));

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Newline-joined `role: content` lines in insertion order
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}: {}", e.role, e.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_MEMORY_CAPACITY,
            entries: VecDeque::with_capacity(DEFAULT_MEMORY_CAPACITY),
        }
    }
}
