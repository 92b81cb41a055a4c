//! Agent Memory
//!
//! Each agent owns a bounded conversation log. The log is a write-only
//! audit trail for the pipeline; accessors exist for inspection and tests.

pub mod store;

pub use store::{ConversationLog, LogEntry, MessageRole, DEFAULT_MEMORY_CAPACITY};
