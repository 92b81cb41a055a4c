//! Stage trait and adapters

use crate::agent::Agent;
use crate::payload::Payload;
use crate::Result;

/// Keys a stage reads and produces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageContract {
    pub reads: Vec<String>,
    pub optional_reads: Vec<String>,
    pub produces: Vec<String>,
}

impl StageContract {
    pub fn new(reads: &[&str], produces: &[&str]) -> Self {
        Self {
            reads: reads.iter().map(|s| s.to_string()).collect(),
            optional_reads: Vec::new(),
            produces: produces.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_optional(mut self, optional_reads: &[&str]) -> Self {
        self.optional_reads = optional_reads.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// A single payload-transforming step
pub trait Stage {
    fn name(&self) -> &str;

    /// `None` when the stage does not declare its keys
    fn contract(&self) -> Option<StageContract> {
        None
    }

    fn run(&mut self, payload: &Payload) -> Result<Payload>;
}

/// Named closure stage
pub struct FnStage<F> {
    name: String,
    contract: Option<StageContract>,
    f: F,
}

impl<F> FnStage<F>
where
    F: FnMut(&Payload) -> Result<Payload>,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            contract: None,
            f,
        }
    }

    pub fn with_contract(mut self, contract: StageContract) -> Self {
        self.contract = Some(contract);
        self
    }
}

impl<F> Stage for FnStage<F>
where
    F: FnMut(&Payload) -> Result<Payload>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn contract(&self) -> Option<StageContract> {
        self.contract.clone()
    }

    fn run(&mut self, payload: &Payload) -> Result<Payload> {
        (self.f)(payload)
    }
}

/// Borrows an agent for the life of the pipeline and runs it as a stage.
///
/// The agent (and its log) stays with the caller once the pipeline is
/// dropped.
pub struct AgentStage<'a, A: Agent> {
    agent: &'a mut A,
}

impl<'a, A: Agent> AgentStage<'a, A> {
    pub fn new(agent: &'a mut A) -> Self {
        Self { agent }
    }
}

impl<'a, A: Agent> Stage for AgentStage<'a, A> {
    fn name(&self) -> &str {
        self.agent.id()
    }

    fn contract(&self) -> Option<StageContract> {
        Some(self.agent.contract())
    }

    fn run(&mut self, payload: &Payload) -> Result<Payload> {
        self.agent.run(payload)
    }
}
