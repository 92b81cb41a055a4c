//! Core data models that cross stage boundaries

use serde::{Deserialize, Serialize};

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Debit,
    Credit,
}

/// Refinance flag as it appears in reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AlertFlag {
    Yes,
    No,
}

//
// ================= Budget (use case A) =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub date: String,
    pub description: String,
    #[serde(default)]
    pub merchant: Option<String>,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub account_id: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl Transaction {
    /// Merchant if present, description otherwise
    pub fn merchant_or_description(&self) -> &str {
        match self.merchant.as_deref() {
            Some(m) if !m.is_empty() => m,
            _ => &self.description,
        }
    }

    /// Debits count as spend; credits contribute nothing
    pub fn spend(&self) -> f64 {
        match self.kind {
            TransactionType::Debit => self.amount,
            TransactionType::Credit => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySpend {
    pub category: String,
    pub total_spend: f64,
    pub n: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MerchantSpend {
    pub merchant: String,
    pub total_spend: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurringMerchant {
    pub merchant: String,
    pub hits: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetInsights {
    pub by_category: Vec<CategorySpend>,
    pub top_merchants: Vec<MerchantSpend>,
    pub possible_recurring: Vec<RecurringMerchant>,
}

//
// ================= Pre-qualification (use case B) =================
//

fn default_interest_rate() -> f64 {
    0.065
}

fn default_prop_tax_monthly() -> f64 {
    300.0
}

fn default_insurance_monthly() -> f64 {
    120.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BorrowerProfile {
    pub borrower_id: String,
    pub income_monthly: f64,
    pub debts_monthly: f64,
    pub fico: u32,
    pub home_price: f64,
    pub down_payment: f64,
    #[serde(default = "default_interest_rate")]
    pub interest_rate: f64,
    #[serde(default = "default_prop_tax_monthly")]
    pub prop_tax_monthly: f64,
    #[serde(default = "default_insurance_monthly")]
    pub insurance_monthly: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrequalCalc {
    pub dti: f64,
    pub ltv: f64,
    pub max_loan: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyOutcome {
    pub flags: Vec<String>,
    pub docs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrequalResult {
    pub borrower_id: String,
    pub calc: PrequalCalc,
    pub policy_flags: Vec<String>,
    pub docs: Vec<String>,
}

//
// ================= Refinance (use case C) =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoanInfo {
    pub borrower_id: String,
    pub loan_balance: f64,
    /// Annual rate, e.g. 0.065
    pub current_rate: f64,
    pub remaining_term_months: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateInfo {
    #[serde(default)]
    pub date: String,
    pub term_months: u32,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavingsRow {
    pub borrower_id: String,
    pub current_rate: f64,
    pub market_rate: f64,
    pub monthly_savings: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefiAlert {
    pub borrower_id: String,
    pub current_rate: f64,
    pub market_rate: f64,
    pub monthly_savings: f64,
    pub refi_alert: AlertFlag,
    #[serde(default)]
    pub notes: Vec<String>,
}

//
// ================= Tool I/O =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub tool_name: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub data: serde_json::Value,
    pub error: Option<String>,
}
