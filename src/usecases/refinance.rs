//! Use case C: refinance alerts
//!
//! rates → rate selector → loans attached → savings calculator →
//! threshold attached → alert classifier

use crate::agent::{AgentCore, AlertClassifierAgent, RateSelectorAgent, SavingsCalculatorAgent};
use crate::config::AppConfig;
use crate::loaders::{load_loans_jsonl, load_rates_jsonl};
use crate::memory::DEFAULT_MEMORY_CAPACITY;
use crate::models::{LoanInfo, RateInfo, RefiAlert};
use crate::payload::Payload;
use crate::pipeline::{Pipeline, StageContract};
use crate::registry::Registries;
use crate::report;
use crate::tools::ToolRegistry;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

pub const RATE_AGENT_ID: &str = "rate_retriever";
pub const SAVINGS_AGENT_ID: &str = "savings";
pub const ALERT_AGENT_ID: &str = "alert";

pub const REPORT_FILE: &str = "c_refi_alerts.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefiReport {
    pub market_rate: Option<f64>,
    pub alerts: Vec<RefiAlert>,
}

/// The three agents of the refinance pipeline
pub struct RefinanceAgents {
    pub rate: RateSelectorAgent,
    pub savings: SavingsCalculatorAgent,
    pub alert: AlertClassifierAgent,
}

impl RefinanceAgents {
    /// Agents configured in the registry use their descriptor; the rest
    /// fall back to the built-in allowlists.
    pub fn from_registries(registries: &Registries, tools: Arc<ToolRegistry>) -> Result<Self> {
        let core = |id: &str, defaults: &[&str]| match registries.agent(id) {
            Some(descriptor) => AgentCore::from_descriptor(descriptor),
            None => AgentCore::new(id, defaults.iter().copied(), DEFAULT_MEMORY_CAPACITY),
        };

        Ok(Self {
            rate: RateSelectorAgent::new(core(RATE_AGENT_ID, &[])?),
            savings: SavingsCalculatorAgent::new(
                core(SAVINGS_AGENT_ID, &["calculate_savings"])?,
                tools.clone(),
            ),
            alert: AlertClassifierAgent::new(core(ALERT_AGENT_ID, &["should_alert"])?, tools),
        })
    }
}

pub fn refinance_alerts(
    agents: &mut RefinanceAgents,
    loans: &[LoanInfo],
    rates: &[RateInfo],
    term_months: Option<u32>,
    threshold: f64,
) -> Result<RefiReport> {
    let mut pipeline = Pipeline::new("refinance_alerts")
        .then_checked(
            "load_rates",
            StageContract::new(&[], &["rates", "term_months"]),
            |_: &Payload| {
                Payload::new()
                    .with("rates", rates)?
                    .with("term_months", term_months)
            },
        )
        .agent(&mut agents.rate)
        .then_checked(
            "attach_loans",
            StageContract::new(&["market_rate"], &["loans", "market_rate"]),
            |p: &Payload| {
                let market_rate: f64 = p.require("attach_loans", "market_rate")?;
                Payload::new()
                    .with("loans", loans)?
                    .with("market_rate", market_rate)
            },
        )
        .agent(&mut agents.savings)
        .then_checked(
            "attach_threshold",
            StageContract::new(&["savings"], &["savings", "threshold"]),
            |p: &Payload| {
                let savings: serde_json::Value = p.require("attach_threshold", "savings")?;
                Payload::new()
                    .with("savings", savings)?
                    .with("threshold", threshold)
            },
        )
        .agent(&mut agents.alert);

    let (out, record) = pipeline.execute_traced(Payload::new())?;
    debug!(run_id = %record.run_id, stages = record.stages.len(), "Refinance trace recorded");

    let alerts: Vec<RefiAlert> = out.require("report", "alerts")?;

    Ok(RefiReport {
        market_rate: alerts.first().map(|a| a.market_rate),
        alerts,
    })
}

pub fn run(config: &AppConfig, registries: &Registries, tools: Arc<ToolRegistry>) -> Result<()> {
    let loans = load_loans_jsonl(&config.data_dir.join("loans.jsonl"))?;
    let rates = load_rates_jsonl(&config.data_dir.join("rates.jsonl"))?;

    let mut agents = RefinanceAgents::from_registries(registries, tools)?;
    let report = refinance_alerts(
        &mut agents,
        &loans,
        &rates,
        config.refi_term_months,
        config.refi_threshold,
    )?;

    info!(
        alerts = report.alerts.len(),
        market_rate = ?report.market_rate,
        "Refinance alerts computed"
    );

    report::publish(&config.output_dir.join("c").join(REPORT_FILE), &report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::error::PipelineError;
    use crate::models::AlertFlag;
    use crate::registry::{parse_agents, DuplicatePolicy};
    use crate::tools::create_default_registry;

    fn loans() -> Vec<LoanInfo> {
        vec![
            LoanInfo {
                borrower_id: "B1".to_string(),
                loan_balance: 200_000.0,
                current_rate: 0.07,
                remaining_term_months: 300,
            },
            LoanInfo {
                borrower_id: "B2".to_string(),
                loan_balance: 90_000.0,
                current_rate: 0.052,
                remaining_term_months: 120,
            },
        ]
    }

    fn rates() -> Vec<RateInfo> {
        vec![
            RateInfo { date: "2024-03-01".to_string(), term_months: 360, rate: 0.055 },
            RateInfo { date: "2024-03-01".to_string(), term_months: 180, rate: 0.05 },
        ]
    }

    fn agents() -> RefinanceAgents {
        RefinanceAgents::from_registries(&Registries::default(), Arc::new(create_default_registry()))
            .unwrap()
    }

    #[test]
    fn test_end_to_end() {
        let mut agents = agents();
        let report = refinance_alerts(&mut agents, &loans(), &rates(), None, 150.0).unwrap();

        assert_eq!(report.market_rate, Some(0.05));
        assert_eq!(report.alerts.len(), 2);
        assert_eq!(report.alerts[0].borrower_id, "B1");
        assert_eq!(report.alerts[0].refi_alert, AlertFlag::Yes);
        assert_eq!(report.alerts[1].refi_alert, AlertFlag::No);

        // every agent logged exactly once
        assert_eq!(agents.rate.core().log().len(), 1);
        assert_eq!(agents.savings.core().log().len(), 1);
        assert_eq!(agents.alert.core().log().len(), 1);
    }

    #[test]
    fn test_term_filter() {
        let report = refinance_alerts(&mut agents(), &loans(), &rates(), Some(360), 150.0).unwrap();
        assert_eq!(report.market_rate, Some(0.055));
    }

    #[test]
    fn test_no_loans_has_no_market_rate() {
        let report = refinance_alerts(&mut agents(), &[], &rates(), None, 150.0).unwrap();
        assert_eq!(report.market_rate, None);
        assert!(report.alerts.is_empty());
    }

    #[test]
    fn test_registry_capabilities_are_enforced() {
        let registries = Registries {
            agents: parse_agents(
                "savings:\n  tools: [should_alert]\n",
                "agents.yml",
                DuplicatePolicy::Reject,
            )
            .unwrap(),
            tools: Default::default(),
        };
        let mut agents =
            RefinanceAgents::from_registries(&registries, Arc::new(create_default_registry())).unwrap();

        let err = refinance_alerts(&mut agents, &loans(), &rates(), None, 150.0).unwrap_err();
        match err {
            PipelineError::StageFailed { stage, source, .. } => {
                assert_eq!(stage, "savings");
                assert!(matches!(*source, PipelineError::CapabilityDenied { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_rates_aborts_at_rate_stage() {
        let err = refinance_alerts(&mut agents(), &loans(), &[], None, 150.0).unwrap_err();
        match err {
            PipelineError::StageFailed { index, stage, .. } => {
                assert_eq!(index, 1);
                assert_eq!(stage, RATE_AGENT_ID);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
