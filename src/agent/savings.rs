//! Refinance savings per loan

use super::{Agent, AgentCore};
use crate::error::PipelineError;
use crate::memory::MessageRole;
use crate::models::{LoanInfo, SavingsRow};
use crate::payload::Payload;
use crate::pipeline::StageContract;
use crate::tools::ToolRegistry;
use crate::Result;
use serde_json::json;
use std::sync::Arc;

/// Reads `loans` and `market_rate`; produces `savings`.
///
/// Each loan is priced through the `calculate_savings` tool, so the agent
/// must hold that capability.
pub struct SavingsCalculatorAgent {
    core: AgentCore,
    tools: Arc<ToolRegistry>,
}

impl SavingsCalculatorAgent {
    pub fn new(core: AgentCore, tools: Arc<ToolRegistry>) -> Self {
        Self { core, tools }
    }
}

impl Agent for SavingsCalculatorAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn contract(&self) -> StageContract {
        StageContract::new(&["loans", "market_rate"], &["savings"])
    }

    fn run(&mut self, payload: &Payload) -> Result<Payload> {
        let stage = self.core.id().to_string();
        let loans: Vec<LoanInfo> = payload.require(&stage, "loans")?;
        let market_rate: f64 = payload.require(&stage, "market_rate")?;

        let mut rows = Vec::with_capacity(loans.len());

        for loan in &loans {
            let output = self.core.invoke(
                &self.tools,
                "calculate_savings",
                json!({ "loan": loan, "market_rate": market_rate }),
            )?;

            let monthly_savings = output.data["monthly_savings"].as_f64().ok_or_else(|| {
                PipelineError::ToolError("calculate_savings returned no monthly_savings".to_string())
            })?;

            rows.push(SavingsRow {
                borrower_id: loan.borrower_id.clone(),
                current_rate: loan.current_rate,
                market_rate,
                monthly_savings,
            });
        }

        self.core
            .remember(MessageRole::System, format!("Computed savings for {} loans", rows.len()));

        Payload::new().with("savings", rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance;
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
                loan_balance: 150_000.0,
                current_rate: 0.04,
                remaining_term_months: 240,
            },
        ]
    }

    fn agent(capabilities: &[&str]) -> SavingsCalculatorAgent {
        SavingsCalculatorAgent::new(
            AgentCore::new("savings", capabilities.iter().copied(), 6).unwrap(),
            Arc::new(create_default_registry()),
        )
    }

    #[test]
    fn test_savings_rows() {
        let payload = Payload::new()
            .with("loans", loans())
            .unwrap()
            .with("market_rate", 0.05)
            .unwrap();

        let mut agent = agent(&["calculate_savings"]);
        let out = agent.run(&payload).unwrap();
        let rows: Vec<SavingsRow> = out.require("test", "savings").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].borrower_id, "B1");
        assert_eq!(rows[0].market_rate, 0.05);
        assert_eq!(
            rows[0].monthly_savings,
            finance::calculate_savings(&loans()[0], 0.05)
        );
        assert!(rows[0].monthly_savings > 0.0);
        assert!(rows[1].monthly_savings < 0.0);

        assert_eq!(agent.core().log().render(), "system: Computed savings for 2 loans");
    }

    #[test]
    fn test_zero_term_loan() {
        let loan = LoanInfo {
            borrower_id: "B3".to_string(),
            loan_balance: 1_000.0,
            current_rate: 0.07,
            remaining_term_months: 0,
        };
        let payload = Payload::new()
            .with("loans", vec![loan])
            .unwrap()
            .with("market_rate", 0.05)
            .unwrap();

        let out = agent(&["calculate_savings"]).run(&payload).unwrap();
        let rows: Vec<SavingsRow> = out.require("test", "savings").unwrap();
        assert_eq!(rows[0].monthly_savings, 1.67);
    }

    #[test]
    fn test_capability_denied() {
        let payload = Payload::new()
            .with("loans", loans())
            .unwrap()
            .with("market_rate", 0.05)
            .unwrap();

        let err = agent(&["should_alert"]).run(&payload).unwrap_err();
        assert!(matches!(err, PipelineError::CapabilityDenied { .. }));
    }

    #[test]
    fn test_missing_market_rate() {
        let payload = Payload::new().with("loans", loans()).unwrap();
        let err = agent(&["calculate_savings"]).run(&payload).unwrap_err();

        match err {
            PipelineError::MissingField { stage, key } => {
                assert_eq!(stage, "savings");
                assert_eq!(key, "market_rate");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
