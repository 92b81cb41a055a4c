//! Market rate selection

use super::{Agent, AgentCore};
use crate::error::PipelineError;
use crate::memory::MessageRole;
use crate::models::RateInfo;
use crate::payload::Payload;
use crate::pipeline::StageContract;
use crate::Result;

/// Picks the lowest rate, optionally restricted to one term.
///
/// Reads `rates` and optional `term_months`; produces `market_rate`.
/// When no rate matches the term the global minimum is used instead.
pub struct RateSelectorAgent {
    core: AgentCore,
}

impl RateSelectorAgent {
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }
}

/// First rate achieving the minimum
fn min_rate<'a>(rates: impl Iterator<Item = &'a RateInfo>) -> Option<f64> {
    rates.map(|r| r.rate).fold(None, |best, rate| match best {
        Some(b) if b <= rate => Some(b),
        _ => Some(rate),
    })
}

pub fn select_market_rate(rates: &[RateInfo], term_months: Option<u32>) -> Option<f64> {
    match term_months {
        Some(term) => min_rate(rates.iter().filter(|r| r.term_months == term))
            .or_else(|| min_rate(rates.iter())),
        None => min_rate(rates.iter()),
    }
}

impl Agent for RateSelectorAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn contract(&self) -> StageContract {
        StageContract::new(&["rates"], &["market_rate"]).with_optional(&["term_months"])
    }

    fn run(&mut self, payload: &Payload) -> Result<Payload> {
        let stage = self.core.id().to_string();
        let rates: Vec<RateInfo> = payload.require(&stage, "rates")?;
        let term_months: Option<u32> = payload.optional(&stage, "term_months")?;

        let market_rate =
            select_market_rate(&rates, term_months).ok_or_else(|| PipelineError::InvalidField {
                stage: stage.clone(),
                key: "rates".to_string(),
                reason: "no rates to select from".to_string(),
            })?;

        self.core
            .remember(MessageRole::System, format!("Selected market rate {:.4}", market_rate));

        Payload::new().with("market_rate", market_rate)
    }
}
