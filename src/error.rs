//! Error types for the agent pipelines

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {

    // =============================
    // Configuration Errors
    // =============================

    #[error("Invalid registry {registry}: {reason}")]
    InvalidRegistry { registry: String, reason: String },

    #[error("Invalid entry '{key}' in {registry}: {reason}")]
    InvalidEntry {
        registry: String,
        key: String,
        reason: String,
    },

    #[error("Duplicate entry '{key}' in {registry}")]
    DuplicateEntry { registry: String, key: String },

    #[error("Unresolved reference in {registry}: {details}")]
    UnresolvedReference { registry: String, details: String },

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // Stage Input Errors
    // =============================

    #[error("Stage '{stage}' is missing required field '{key}'")]
    MissingField { stage: String, key: String },

    #[error("Stage '{stage}' received invalid field '{key}': {reason}")]
    InvalidField {
        stage: String,
        key: String,
        reason: String,
    },

    #[error("Stage '{stage}' requires '{key}' but no upstream stage produces it")]
    UnsatisfiedInput { stage: String, key: String },

    #[error("Stage {index} ('{stage}') failed: {source}")]
    StageFailed {
        index: usize,
        stage: String,
        #[source]
        source: Box<PipelineError>,
    },

    // =============================
    // Agent Errors
    // =============================

    #[error("Invalid agent: {0}")]
    InvalidAgent(String),

    #[error("Invalid memory capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    #[error("Agent '{agent}' is not allowed to use '{capability}'")]
    CapabilityDenied { agent: String, capability: String },

    // =============================
    // Tool Errors
    // =============================

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    #[error("Tool error: {0}")]
    ToolError(String),

    // =============================
    // Data Errors
    // =============================

    #[error("Data error in {path}: {reason}")]
    DataError { path: String, reason: String },

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PipelineError {
    /// The innermost error, looking through `StageFailed` wrappers
    pub fn root(&self) -> &PipelineError {
        match self {
            PipelineError::StageFailed { source, .. } => source.root(),
            other => other,
        }
    }
}
