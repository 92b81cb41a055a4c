//! Domain calculators
//!
//! Pure functions invoked by pipeline stages: amortization, refinance
//! savings, pre-qualification ratios and budget categorization.

pub mod budget;

pub use budget::{budget_insights, categorize};

use crate::models::{BorrowerProfile, LoanInfo, PolicyOutcome, PrequalCalc};

/// Term used for purchase-mortgage estimates
pub const MORTGAGE_TERM_MONTHS: u32 = 360;

/// Default savings threshold for a refinance alert
pub const DEFAULT_ALERT_THRESHOLD: f64 = 150.0;

const TARGET_DTI: f64 = 0.36;
const MAX_DTI: f64 = 0.43;
const MIN_FICO: u32 = 620;
const MAX_LTV: f64 = 0.97;

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Standard amortized monthly payment.
///
/// A zero rate degrades to straight-line repayment over the term. A zero
/// term is treated as a single final payment.
pub fn monthly_payment(principal: f64, annual_rate: f64, term_months: u32) -> f64 {
    let n = f64::from(term_months.max(1));
    if annual_rate == 0.0 {
        return principal / n;
    }

    let r = annual_rate / 12.0;
    let growth = (1.0 + r).powf(n);
    principal * (r * growth) / (growth - 1.0)
}

/// Monthly payment difference between the loan's rate and `market_rate`,
/// rounded to cents. Positive when the market rate is lower.
pub fn calculate_savings(loan: &LoanInfo, market_rate: f64) -> f64 {
    let current = monthly_payment(loan.loan_balance, loan.current_rate, loan.remaining_term_months);
    let new = monthly_payment(loan.loan_balance, market_rate, loan.remaining_term_months);
    round_to(current - new, 2)
}

/// Inclusive threshold rule
pub fn should_alert(monthly_savings: f64, threshold: f64) -> bool {
    monthly_savings >= threshold
}

fn financed_amount(profile: &BorrowerProfile) -> f64 {
    profile.home_price - profile.down_payment
}

/// Principal, interest, taxes and insurance over a 30 year term
pub fn compute_piti(profile: &BorrowerProfile) -> f64 {
    let pi = monthly_payment(
        financed_amount(profile),
        profile.interest_rate,
        MORTGAGE_TERM_MONTHS,
    );
    round_to(pi + profile.prop_tax_monthly + profile.insurance_monthly, 2)
}

pub fn compute_dti(profile: &BorrowerProfile) -> f64 {
    let monthly = profile.debts_monthly + compute_piti(profile);
    round_to(monthly / profile.income_monthly.max(1.0), 4)
}

pub fn compute_ltv(profile: &BorrowerProfile) -> f64 {
    round_to(financed_amount(profile) / profile.home_price.max(1.0), 4)
}

/// Largest principal whose payment keeps DTI at the target
pub fn max_loan_estimate(profile: &BorrowerProfile) -> f64 {
    let allowable = (profile.income_monthly * TARGET_DTI - profile.debts_monthly).max(0.0);
    let r = profile.interest_rate / 12.0;
    if r == 0.0 {
        return 0.0;
    }

    let growth = (1.0 + r).powf(f64::from(MORTGAGE_TERM_MONTHS));
    round_to(allowable * ((growth - 1.0) / (r * growth)), 2)
}

pub fn prequal_calc(profile: &BorrowerProfile) -> PrequalCalc {
    PrequalCalc {
        dti: compute_dti(profile),
        ltv: compute_ltv(profile),
        max_loan: max_loan_estimate(profile),
    }
}

pub fn policy_check(profile: &BorrowerProfile) -> PolicyOutcome {
    let mut flags = Vec::new();

    if compute_dti(profile) > MAX_DTI {
        flags.push("DTI>43%".to_string());
    }
    if profile.fico < MIN_FICO {
        flags.push("LowFICO".to_string());
    }
    if compute_ltv(profile) > MAX_LTV {
        flags.push("HighLTV".to_string());
    }

    PolicyOutcome {
        flags,
        docs: vec![
            "Pay stubs".to_string(),
            "W-2".to_string(),
            "Bank statements".to_string(),
        ],
    }
}
