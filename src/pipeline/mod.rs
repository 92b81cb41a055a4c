//! Linear pipeline engine
//!
//! Stages run strictly in registration order; each stage's output payload
//! becomes the next stage's input. Any failure aborts the run.
//!
//! Stages may declare a `StageContract`. Declared contracts are checked
//! before the first stage runs, so a stage requiring a key that nothing
//! upstream produces fails at assembly rather than mid-run.

pub mod stage;

pub use stage::{AgentStage, FnStage, Stage, StageContract};

use crate::agent::Agent;
use crate::audit::{fingerprint, RunRecord, StageRecord};
use crate::error::PipelineError;
use crate::payload::Payload;
use crate::Result;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, error, info};

/// Ordered sequence of stages
pub struct Pipeline<'a> {
    name: String,
    stages: Vec<Box<dyn Stage + 'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Add a stage at the end
    pub fn append(mut self, stage: impl Stage + 'a) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Add an undeclared closure stage
    pub fn then<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: FnMut(&Payload) -> Result<Payload> + 'a,
    {
        self.append(FnStage::new(name, f))
    }

    /// Add a closure stage with a declared contract
    pub fn then_checked<F>(self, name: impl Into<String>, contract: StageContract, f: F) -> Self
    where
        F: FnMut(&Payload) -> Result<Payload> + 'a,
    {
        self.append(FnStage::new(name, f).with_contract(contract))
    }

    /// Bind an agent's `run` as the next stage
    pub fn agent<A: Agent>(self, agent: &'a mut A) -> Self {
        self.append(AgentStage::new(agent))
    }

    /// Check declared contracts against the keys of the initial payload.
    ///
    /// After a declared stage exactly its `produces` keys are available.
    /// After an undeclared stage nothing is known, so checks resume at the
    /// next declared stage.
    pub fn validate<'k, I>(&self, initial_keys: I) -> Result<()>
    where
        I: IntoIterator<Item = &'k str>,
    {
        let mut available: Option<BTreeSet<String>> =
            Some(initial_keys.into_iter().map(str::to_string).collect());

        for stage in &self.stages {
            match stage.contract() {
                Some(contract) => {
                    if let Some(keys) = &available {
                        if let Some(missing) = contract.reads.iter().find(|k| !keys.contains(*k)) {
                            return Err(PipelineError::UnsatisfiedInput {
                                stage: stage.name().to_string(),
                                key: missing.clone(),
                            });
                        }
                    }
                    available = Some(contract.produces.iter().cloned().collect());
                }
                None => available = None,
            }
        }

        Ok(())
    }

    /// Run every stage in order and return the final payload
    pub fn execute(&mut self, initial: Payload) -> Result<Payload> {
        self.execute_traced(initial).map(|(payload, _)| payload)
    }

    /// Like `execute`, also returning the per-stage trace
    pub fn execute_traced(&mut self, initial: Payload) -> Result<(Payload, RunRecord)> {
        self.validate(initial.keys())?;

        let mut record = RunRecord::start(&self.name, fingerprint(&initial));
        let run_start = Instant::now();

        info!(
            run_id = %record.run_id,
            pipeline = %self.name,
            stage_count = self.stages.len(),
            "Starting pipeline"
        );

        let mut payload = initial;

        for (index, stage) in self.stages.iter_mut().enumerate() {
            let stage_start = Instant::now();
            debug!(index, stage = %stage.name(), "Running stage");

            let output = stage.run(&payload).map_err(|e| {
                error!(
                    run_id = %record.run_id,
                    index,
                    stage = %stage.name(),
                    error = %e,
                    "Stage failed, aborting pipeline"
                );
                PipelineError::StageFailed {
                    index,
                    stage: stage.name().to_string(),
                    source: Box::new(e),
                }
            })?;

            record.stages.push(StageRecord {
                index,
                stage: stage.name().to_string(),
                output_keys: output.keys().map(str::to_string).collect(),
                output_hash: fingerprint(&output),
                execution_time_ms: stage_start.elapsed().as_millis() as u64,
            });

            payload = output;
        }

        record.finish(fingerprint(&payload), run_start.elapsed().as_millis() as u64);

        info!(
            run_id = %record.run_id,
            pipeline = %self.name,
            output_hash = %record.output_hash,
            "Pipeline completed"
        );

        Ok((payload, record))
    }
}
