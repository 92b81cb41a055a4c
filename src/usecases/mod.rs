//! End-to-end pipelines
//!
//! - A: budget insights from a transaction CSV
//! - B: mortgage pre-qualification per borrower
//! - C: refinance alerts driven by registry-configured agents

pub mod budget;
pub mod prequal;
pub mod refinance;

use crate::config::AppConfig;
use crate::registry::Registries;
use crate::tools::ToolRegistry;
use crate::Result;
use std::fmt;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseCase {
    Budget,
    Prequal,
    Refinance,
}

impl UseCase {
    pub const ALL: [UseCase; 3] = [UseCase::Budget, UseCase::Prequal, UseCase::Refinance];
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UseCase::Budget => write!(f, "a"),
            UseCase::Prequal => write!(f, "b"),
            UseCase::Refinance => write!(f, "c"),
        }
    }
}

/// Run the selected use cases in order, stopping at the first failure
pub fn run(
    selection: &[UseCase],
    config: &AppConfig,
    registries: &Registries,
    tools: Arc<ToolRegistry>,
) -> Result<()> {
    for use_case in selection {
        info!(use_case = %use_case, "Running use case");
        match use_case {
            UseCase::Budget => budget::run(config)?,
            UseCase::Prequal => prequal::run(config)?,
            UseCase::Refinance => refinance::run(config, registries, tools.clone())?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertFlag;
    use crate::registry::DuplicatePolicy;
    use crate::tools::create_default_registry;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_all_use_cases_over_sample_data() {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let out = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: root.join("data"),
            output_dir: out.path().to_path_buf(),
            agents_registry: root.join("config").join("agents.yml"),
            tools_registry: root.join("config").join("tools.yml"),
            ..AppConfig::default()
        };

        let tools = Arc::new(create_default_registry());
        let registries = Registries::load(
            &config.agents_registry,
            &config.tools_registry,
            DuplicatePolicy::Reject,
        )
        .unwrap();
        registries.cross_check(&tools).unwrap();

        run(&UseCase::ALL, &config, &registries, tools).unwrap();

        let insights = read_json(&out.path().join("a").join(budget::REPORT_FILE));
        assert!(insights["insights"]["by_category"].is_array());

        let prequal_report = read_json(&out.path().join("b").join(prequal::REPORT_FILE));
        assert_eq!(prequal_report["results"].as_array().unwrap().len(), 3);

        let refi: refinance::RefiReport = serde_json::from_value(read_json(
            &out.path().join("c").join(refinance::REPORT_FILE),
        ))
        .unwrap();
        assert_eq!(refi.market_rate, Some(0.0539));
        assert_eq!(refi.alerts.len(), 3);
        assert_eq!(refi.alerts[0].refi_alert, AlertFlag::Yes);
    }
}
