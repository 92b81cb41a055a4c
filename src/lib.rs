//! Financial Agent Pipelines
//!
//! Small deterministic pipelines over financial data:
//! - Stages pass a `Payload` (string-keyed JSON map) left to right
//! - Stages may declare the keys they read and produce; pipelines are
//!   validated against those contracts before any stage runs
//! - Agents hold a bounded conversation log and may only invoke the tools
//!   on their allowlist
//! - Agent and tool descriptors are loaded from YAML registries
//!
//! FLOW:
//! LOAD → STAGE₁ → STAGE₂ → … → REPORT

pub mod agent;
pub mod audit;
pub mod config;
pub mod error;
pub mod finance;
pub mod loaders;
pub mod memory;
pub mod models;
pub mod payload;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod tools;
pub mod usecases;

pub use error::{PipelineError, Result};

// Re-export common types
pub use payload::Payload;
pub use pipeline::{Pipeline, Stage, StageContract};
