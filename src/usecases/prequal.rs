//! Use case B: mortgage pre-qualification
//!
//! One pipeline per borrower: profile → planner (ratios) → compliance
//! (policy flags and required documents).

use crate::config::AppConfig;
use crate::finance::{policy_check, prequal_calc};
use crate::loaders::load_borrowers_jsonl;
use crate::models::{BorrowerProfile, PrequalCalc, PrequalResult};
use crate::payload::Payload;
use crate::pipeline::{Pipeline, StageContract};
use crate::report;
use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const REPORT_FILE: &str = "b_prequal.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrequalReport {
    pub results: Vec<PrequalResult>,
}

fn planner(payload: &Payload) -> Result<Payload> {
    let profile: BorrowerProfile = payload.require("planner", "profile")?;
    let calc = prequal_calc(&profile);

    Payload::new().with("profile", profile)?.with("calc", calc)
}

fn compliance(payload: &Payload) -> Result<Payload> {
    let profile: BorrowerProfile = payload.require("compliance", "profile")?;
    let calc: PrequalCalc = payload.require("compliance", "calc")?;
    let outcome = policy_check(&profile);

    Payload::new()
        .with("profile", profile)?
        .with("calc", calc)?
        .with("policy_flags", outcome.flags)?
        .with("docs", outcome.docs)
}

pub fn prequalify(profile: &BorrowerProfile) -> Result<PrequalResult> {
    let mut pipeline = Pipeline::new("mortgage_prequal")
        .then_checked(
            "load_profile",
            StageContract::new(&[], &["profile"]),
            |_: &Payload| Payload::new().with("profile", profile),
        )
        .then_checked(
            "planner",
            StageContract::new(&["profile"], &["profile", "calc"]),
            planner,
        )
        .then_checked(
            "compliance",
            StageContract::new(&["profile", "calc"], &["profile", "calc", "policy_flags", "docs"]),
            compliance,
        );

    let out = pipeline.execute(Payload::new())?;

    Ok(PrequalResult {
        borrower_id: profile.borrower_id.clone(),
        calc: out.require("report", "calc")?,
        policy_flags: out.require("report", "policy_flags")?,
        docs: out.require("report", "docs")?,
    })
}

pub fn prequal_report(profiles: &[BorrowerProfile]) -> Result<PrequalReport> {
    let results = profiles
        .iter()
        .map(prequalify)
        .collect::<Result<Vec<_>>>()?;

    Ok(PrequalReport { results })
}

pub fn run(config: &AppConfig) -> Result<()> {
    let profiles = load_borrowers_jsonl(&config.data_dir.join("borrowers.jsonl"))?;
    let report = prequal_report(&profiles)?;

    let flagged = report
        .results
        .iter()
        .filter(|r| !r.policy_flags.is_empty())
        .count();
    info!(borrowers = report.results.len(), flagged, "Pre-qualification computed");

    report::publish(&config.output_dir.join("b").join(REPORT_FILE), &report)
}
