//! Merchant categorization and spend aggregation

use super::round_to;
use crate::models::{BudgetInsights, CategorySpend, MerchantSpend, RecurringMerchant, Transaction};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

const TOP_MERCHANTS: usize = 5;
const UNKNOWN_CATEGORY: &str = "Unknown";

/// Checked in order; a trailing `*` means prefix match
const MERCHANT_MAP: &[(&str, &str)] = &[
    ("WHOLEFOODS", "Groceries"),
    ("WALMART", "Groceries"),
    ("SHELL", "Gas"),
    ("UBER", "Transport"),
    ("NETFLIX", "Entertainment"),
    ("RENT *", "Rent"),
];

lazy_static! {
    static ref CATEGORY_PATTERNS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"GROC(ERY|ERIES)?|MARKET").unwrap(), "Groceries"),
        (Regex::new(r"FUEL|GAS|SHELL|EXXON").unwrap(), "Gas"),
        (Regex::new(r"UBER|LYFT|TAXI").unwrap(), "Transport"),
        (Regex::new(r"RENT").unwrap(), "Rent"),
        (Regex::new(r"NETFLIX|SPOTIFY|HULU").unwrap(), "Entertainment"),
    ];
}

/// Assign a spending category from merchant (or description) text
pub fn categorize(tx: &Transaction) -> String {
    let desc = tx.merchant_or_description().to_uppercase();

    for (pattern, category) in MERCHANT_MAP {
        if let Some(prefix) = pattern.strip_suffix('*') {
            if desc.starts_with(prefix) {
                return category.to_string();
            }
        }
        if desc.contains(pattern) {
            return category.to_string();
        }
    }

    CATEGORY_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(&desc))
        .map(|(_, category)| category.to_string())
        .unwrap_or_else(|| "Other".to_string())
}

/// Spend by category, top merchants and merchants seen more than once
pub fn budget_insights(transactions: &[Transaction]) -> BudgetInsights {
    let mut by_category: HashMap<&str, (f64, usize)> = HashMap::new();
    let mut by_merchant: HashMap<&str, (f64, usize)> = HashMap::new();

    for tx in transactions {
        let category = tx.category.as_deref().unwrap_or(UNKNOWN_CATEGORY);
        let entry = by_category.entry(category).or_insert((0.0, 0));
        entry.0 += tx.spend();
        entry.1 += 1;

        let entry = by_merchant.entry(tx.merchant_or_description()).or_insert((0.0, 0));
        entry.0 += tx.spend();
        entry.1 += 1;
    }

    let mut categories: Vec<CategorySpend> = by_category
        .into_iter()
        .map(|(category, (total, n))| CategorySpend {
            category: category.to_string(),
            total_spend: round_to(total, 2),
            n,
        })
        .collect();
    categories.sort_by(|a, b| {
        b.total_spend
            .total_cmp(&a.total_spend)
            .then_with(|| a.category.cmp(&b.category))
    });

    let mut merchants: Vec<MerchantSpend> = by_merchant
        .iter()
        .map(|(merchant, (total, _))| MerchantSpend {
            merchant: merchant.to_string(),
            total_spend: round_to(*total, 2),
        })
        .collect();
    merchants.sort_by(|a, b| {
        b.total_spend
            .total_cmp(&a.total_spend)
            .then_with(|| a.merchant.cmp(&b.merchant))
    });
    merchants.truncate(TOP_MERCHANTS);

    let mut recurring: Vec<RecurringMerchant> = by_merchant
        .iter()
        .filter(|(_, (_, hits))| *hits >= 2)
        .map(|(merchant, (_, hits))| RecurringMerchant {
            merchant: merchant.to_string(),
            hits: *hits,
        })
        .collect();
    recurring.sort_by(|a, b| b.hits.cmp(&a.hits).then_with(|| a.merchant.cmp(&b.merchant)));

    BudgetInsights {
        by_category: categories,
        top_merchants: merchants,
        possible_recurring: recurring,
    }
}
