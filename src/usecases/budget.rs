//! Use case A: transaction categorization and budget insights

use crate::config::AppConfig;
use crate::finance::{budget_insights, categorize};
use crate::loaders::load_transactions_csv;
use crate::models::{BudgetInsights, Transaction};
use crate::payload::Payload;
use crate::pipeline::{Pipeline, StageContract};
use crate::report;
use crate::Result;
use tracing::info;

pub const REPORT_FILE: &str = "a_insights.json";

fn classify(payload: &Payload) -> Result<Payload> {
    let transactions: Vec<Transaction> = payload.require("classify", "transactions")?;

    let classified: Vec<Transaction> = transactions
        .into_iter()
        .map(|mut tx| {
            if tx.category.as_deref().map_or(true, str::is_empty) {
                tx.category = Some(categorize(&tx));
            }
            tx
        })
        .collect();

    Payload::new().with("transactions", classified)
}

fn summarize(payload: &Payload) -> Result<Payload> {
    let transactions: Vec<Transaction> = payload.require("report", "transactions")?;
    Payload::new().with("insights", budget_insights(&transactions))
}

/// Returns the final payload, `{ "insights": ... }`
pub fn budget_pipeline(transactions: &[Transaction]) -> Result<Payload> {
    let mut pipeline = Pipeline::new("budget_insights")
        .then_checked(
            "load_transactions",
            StageContract::new(&[], &["transactions"]),
            |_: &Payload| Payload::new().with("transactions", transactions),
        )
        .then_checked(
            "classify",
            StageContract::new(&["transactions"], &["transactions"]),
            classify,
        )
        .then_checked(
            "report",
            StageContract::new(&["transactions"], &["insights"]),
            summarize,
        );

    pipeline.execute(Payload::new())
}

pub fn run(config: &AppConfig) -> Result<()> {
    let transactions = load_transactions_csv(&config.data_dir.join("transactions_sample.csv"))?;
    let result = budget_pipeline(&transactions)?;

    let insights: BudgetInsights = result.require("report", "insights")?;
    info!(
        categories = insights.by_category.len(),
        recurring = insights.possible_recurring.len(),
        "Budget insights computed"
    );

    report::publish(&config.output_dir.join("a").join(REPORT_FILE), &result)
}
