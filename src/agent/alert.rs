//! Refinance alert classification

use super::{Agent, AgentCore};
use crate::error::PipelineError;
use crate::finance::DEFAULT_ALERT_THRESHOLD;
use crate::memory::MessageRole;
use crate::models::{AlertFlag, RefiAlert, SavingsRow};
use crate::payload::Payload;
use crate::pipeline::StageContract;
use crate::tools::ToolRegistry;
use crate::Result;
use serde_json::json;
use std::sync::Arc;

pub const BELOW_THRESHOLD_NOTE: &str = "Below savings threshold";

/// Reads `savings` and optional `threshold`; produces `alerts`.
pub struct AlertClassifierAgent {
    core: AgentCore,
    tools: Arc<ToolRegistry>,
}

impl AlertClassifierAgent {
    pub fn new(core: AgentCore, tools: Arc<ToolRegistry>) -> Self {
        Self { core, tools }
    }
}

impl Agent for AlertClassifierAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn contract(&self) -> StageContract {
        StageContract::new(&["savings"], &["alerts"]).with_optional(&["threshold"])
    }

    fn run(&mut self, payload: &Payload) -> Result<Payload> {
        let stage = self.core.id().to_string();
        let rows: Vec<SavingsRow> = payload.require(&stage, "savings")?;
        let threshold = payload
            .optional::<f64>(&stage, "threshold")?
            .unwrap_or(DEFAULT_ALERT_THRESHOLD);

        let mut alerts = Vec::with_capacity(rows.len());

        for row in rows {
            let output = self.core.invoke(
                &self.tools,
                "should_alert",
                json!({ "monthly_savings": row.monthly_savings, "threshold": threshold }),
            )?;
            let flagged = output.data["alert"].as_bool().ok_or_else(|| {
                PipelineError::ToolError("should_alert returned no alert flag".to_string())
            })?;

            alerts.push(RefiAlert {
                borrower_id: row.borrower_id,
                current_rate: row.current_rate,
                market_rate: row.market_rate,
                monthly_savings: row.monthly_savings,
                refi_alert: if flagged { AlertFlag::Yes } else { AlertFlag::No },
                notes: if flagged {
                    Vec::new()
                } else {
                    vec![BELOW_THRESHOLD_NOTE.to_string()]
                },
            });
        }

        let flagged = alerts
            .iter()
            .filter(|a| a.refi_alert == AlertFlag::Yes)
            .count();
        self.core
            .remember(MessageRole::System, format!("Alert flagged for {} borrowers", flagged));

        Payload::new().with("alerts", alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::create_default_registry;

    fn row(id: &str, monthly_savings: f64) -> SavingsRow {
        SavingsRow {
            borrower_id: id.to_string(),
            current_rate: 0.07,
            market_rate: 0.055,
            monthly_savings,
        }
    }

    fn agent() -> AlertClassifierAgent {
        AlertClassifierAgent::new(
            AgentCore::new("alert", ["should_alert"], 6).unwrap(),
            Arc::new(create_default_registry()),
        )
    }

    fn classify(payload: Payload) -> Vec<RefiAlert> {
        agent()
            .run(&payload)
            .unwrap()
            .require("test", "alerts")
            .unwrap()
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let payload = Payload::new()
            .with("savings", vec![row("B1", 150.0), row("B2", 149.99)])
            .unwrap()
            .with("threshold", 150.0)
            .unwrap();

        let alerts = classify(payload);

        assert_eq!(alerts[0].refi_alert, AlertFlag::Yes);
        assert!(alerts[0].notes.is_empty());
        assert_eq!(alerts[1].refi_alert, AlertFlag::No);
        assert_eq!(alerts[1].notes, vec![BELOW_THRESHOLD_NOTE]);
    }

    #[test]
    fn test_default_threshold() {
        let payload = Payload::new()
            .with("savings", vec![row("B1", 151.0), row("B2", 20.0)])
            .unwrap();

        let alerts = classify(payload);
        assert_eq!(alerts[0].refi_alert, AlertFlag::Yes);
        assert_eq!(alerts[1].refi_alert, AlertFlag::No);
    }

    #[test]
    fn test_flag_serializes_as_yes_no() {
        let payload = Payload::new().with("savings", vec![row("B1", 200.0)]).unwrap();
        let out = agent().run(&payload).unwrap();
        assert_eq!(out.get("alerts").unwrap()[0]["refi_alert"], "Yes");
    }

    #[test]
    fn test_logs_flag_count() {
        let mut agent = agent();
        let payload = Payload::new()
            .with("savings", vec![row("B1", 200.0), row("B2", 10.0)])
            .unwrap();
        agent.run(&payload).unwrap();
        assert_eq!(agent.core().log().render(), "system: Alert flagged for 1 borrowers");
    }
}
