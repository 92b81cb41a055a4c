//! Tool trait and registry
//!
//! Tools are deterministic, side-effect-free operations over the domain
//! calculators. Agents reach them only through a capability-checked
//! dispatcher (see `AgentCore::invoke`).

use crate::error::PipelineError;
use crate::finance;
use crate::models::{BorrowerProfile, LoanInfo, ToolInput, ToolOutput, Transaction};
use crate::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for a single tool (deterministic execution)
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn execute(&self, input: &ToolInput) -> Result<ToolOutput>;
}

/// Tool registry for looking up and executing tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

type Handler = fn(&Value) -> Result<Value>;

/// Tool backed by a plain calculator function
pub struct CalculatorTool {
    tool_name: &'static str,
    tool_description: &'static str,
    handler: Handler,
}

impl CalculatorTool {
    pub fn new(tool_name: &'static str, tool_description: &'static str, handler: Handler) -> Self {
        Self {
            tool_name,
            tool_description,
            handler,
        }
    }
}

impl Tool for CalculatorTool {
    fn name(&self) -> &'static str {
        self.tool_name
    }

    fn description(&self) -> &'static str {
        self.tool_description
    }

    fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        ensure_object_parameters(input)?;
        let data = (self.handler)(&input.parameters)?;

        Ok(ToolOutput {
            success: true,
            data,
            error: None,
        })
    }
}

fn ensure_object_parameters(input: &ToolInput) -> Result<()> {
    if input.parameters.is_object() {
        Ok(())
    } else {
        Err(PipelineError::InvalidToolInput(format!(
            "{}: parameters must be a JSON object",
            input.tool_name
        )))
    }
}

fn params<T: DeserializeOwned>(value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| PipelineError::InvalidToolInput(e.to_string()))
}

//
// ========== Calculator handlers ==========
//

#[derive(Deserialize)]
struct PaymentParams {
    principal: f64,
    annual_rate: f64,
    term_months: u32,
}

#[derive(Deserialize)]
struct SavingsParams {
    loan: LoanInfo,
    market_rate: f64,
}

#[derive(Deserialize)]
struct AlertParams {
    monthly_savings: f64,
    #[serde(default = "default_threshold")]
    threshold: f64,
}

fn default_threshold() -> f64 {
    finance::DEFAULT_ALERT_THRESHOLD
}

#[derive(Deserialize)]
struct ProfileParams {
    profile: BorrowerProfile,
}

#[derive(Deserialize)]
struct TransactionParams {
    transaction: Transaction,
}

#[derive(Deserialize)]
struct TransactionsParams {
    transactions: Vec<Transaction>,
}

fn monthly_payment(value: &Value) -> Result<Value> {
    let p: PaymentParams = params(value)?;
    Ok(json!({
        "monthly_payment": finance::monthly_payment(p.principal, p.annual_rate, p.term_months)
    }))
}

fn calculate_savings(value: &Value) -> Result<Value> {
    let p: SavingsParams = params(value)?;
    Ok(json!({ "monthly_savings": finance::calculate_savings(&p.loan, p.market_rate) }))
}

fn should_alert(value: &Value) -> Result<Value> {
    let p: AlertParams = params(value)?;
    Ok(json!({ "alert": finance::should_alert(p.monthly_savings, p.threshold) }))
}

fn compute_dti(value: &Value) -> Result<Value> {
    let p: ProfileParams = params(value)?;
    Ok(json!({ "dti": finance::compute_dti(&p.profile) }))
}

fn compute_ltv(value: &Value) -> Result<Value> {
    let p: ProfileParams = params(value)?;
    Ok(json!({ "ltv": finance::compute_ltv(&p.profile) }))
}

fn compute_piti(value: &Value) -> Result<Value> {
    let p: ProfileParams = params(value)?;
    Ok(json!({ "piti": finance::compute_piti(&p.profile) }))
}

fn max_loan_estimate(value: &Value) -> Result<Value> {
    let p: ProfileParams = params(value)?;
    Ok(json!({ "max_loan": finance::max_loan_estimate(&p.profile) }))
}

fn policy_check(value: &Value) -> Result<Value> {
    let p: ProfileParams = params(value)?;
    Ok(serde_json::to_value(finance::policy_check(&p.profile))?)
}

fn categorize(value: &Value) -> Result<Value> {
    let p: TransactionParams = params(value)?;
    Ok(json!({ "category": finance::categorize(&p.transaction) }))
}

fn budget_insights(value: &Value) -> Result<Value> {
    let p: TransactionsParams = params(value)?;
    Ok(serde_json::to_value(finance::budget_insights(&p.transactions))?)
}

/// Create a registry with every calculator-backed tool.
pub fn create_default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    let tools = [
        CalculatorTool::new(
            "monthly_payment",
            "Amortized monthly payment for a principal, annual rate and term",
            monthly_payment,
        ),
        CalculatorTool::new(
            "calculate_savings",
            "Monthly payment savings of refinancing a loan at the market rate",
            calculate_savings,
        ),
        CalculatorTool::new(
            "should_alert",
            "Whether monthly savings meet the alert threshold",
            should_alert,
        ),
        CalculatorTool::new("compute_dti", "Debt-to-income ratio", compute_dti),
        CalculatorTool::new("compute_ltv", "Loan-to-value ratio", compute_ltv),
        CalculatorTool::new(
            "compute_piti",
            "Principal, interest, taxes and insurance",
            compute_piti,
        ),
        CalculatorTool::new(
            "max_loan_estimate",
            "Maximum principal at the target debt-to-income ratio",
            max_loan_estimate,
        ),
        CalculatorTool::new(
            "policy_check",
            "Underwriting policy flags and required documents",
            policy_check,
        ),
        CalculatorTool::new("categorize", "Spending category for a transaction", categorize),
        CalculatorTool::new(
            "budget_insights",
            "Spend by category, top merchants and recurring merchants",
            budget_insights,
        ),
    ];

    for tool in tools {
        registry.register(Arc::new(tool));
    }

    registry
}
