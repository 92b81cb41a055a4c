//! Agent contract
//!
//! An agent is a pipeline stage bound to an identity, a capability
//! allowlist and a private bounded log. Calls into the tool registry go
//! through `AgentCore::invoke`, which refuses any tool outside the allowlist.

pub mod alert;
pub mod rate;
pub mod savings;

pub use alert::AlertClassifierAgent;
pub use rate::RateSelectorAgent;
pub use savings::SavingsCalculatorAgent;

use crate::error::PipelineError;
use crate::memory::{ConversationLog, MessageRole};
use crate::models::{ToolInput, ToolOutput};
use crate::payload::Payload;
use crate::pipeline::StageContract;
use crate::registry::AgentDescriptor;
use crate::tools::ToolRegistry;
use crate::Result;
use std::collections::BTreeSet;
use tracing::debug;

/// Identity, allowlist and log shared by every agent
#[derive(Debug, Clone)]
pub struct AgentCore {
    id: String,
    capabilities: BTreeSet<String>,
    log: ConversationLog,
}

impl AgentCore {
    pub fn new<I, S>(id: impl Into<String>, capabilities: I, memory_capacity: usize) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PipelineError::InvalidAgent(
                "agent id must not be empty".to_string(),
            ));
        }

        Ok(Self {
            id,
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            log: ConversationLog::new(memory_capacity)?,
        })
    }

    pub fn from_descriptor(descriptor: &AgentDescriptor) -> Result<Self> {
        Self::new(
            descriptor.id.clone(),
            descriptor.declared_capabilities.iter().cloned(),
            descriptor.memory_capacity,
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capabilities(&self) -> &BTreeSet<String> {
        &self.capabilities
    }

    pub fn allows(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn remember(&mut self, role: MessageRole, content: impl Into<String>) {
        self.log.append(role, content);
    }

    /// Capability-checked tool dispatch
    pub fn invoke(
        &self,
        tools: &ToolRegistry,
        tool_name: &str,
        parameters: serde_json::Value,
    ) -> Result<ToolOutput> {
        if !self.allows(tool_name) {
            return Err(PipelineError::CapabilityDenied {
                agent: self.id.clone(),
                capability: tool_name.to_string(),
            });
        }

        let tool = tools
            .get(tool_name)
            .ok_or_else(|| PipelineError::ToolNotFound(tool_name.to_string()))?;

        debug!(
            agent = %self.id,
            tool = tool_name,
            description = tool.description(),
            "Dispatching tool"
        );

        let output = tool.execute(&ToolInput {
            tool_name: tool_name.to_string(),
            parameters,
        })?;

        if !output.success {
            return Err(PipelineError::ToolError(format!(
                "{}: {}",
                tool_name,
                output.error.unwrap_or_else(|| "unknown failure".to_string())
            )));
        }

        Ok(output)
    }
}

/// A processing unit with one operation: payload in, fresh payload out
pub trait Agent {
    fn core(&self) -> &AgentCore;

    /// Keys read and produced by `run`
    fn contract(&self) -> StageContract;

    fn run(&mut self, payload: &Payload) -> Result<Payload>;

    fn id(&self) -> &str {
        self.core().id()
    }
}
