//! Sample data loaders
//!
//! Transactions come from CSV; loans, rates and borrower profiles from
//! JSON lines (one record per line, blank lines skipped).

use crate::error::PipelineError;
use crate::models::{BorrowerProfile, LoanInfo, RateInfo, Transaction};
use crate::Result;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

pub fn load_transactions_csv(path: &Path) -> Result<Vec<Transaction>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| data_error(path, e.to_string()))?;

    let mut rows = Vec::new();
    for record in reader.deserialize::<Transaction>() {
        rows.push(record.map_err(|e| csv_error(path, e))?);
    }

    debug!(path = %path.display(), rows = rows.len(), "Loaded transactions");
    Ok(rows)
}

pub fn load_loans_jsonl(path: &Path) -> Result<Vec<LoanInfo>> {
    load_jsonl(path)
}

pub fn load_rates_jsonl(path: &Path) -> Result<Vec<RateInfo>> {
    load_jsonl(path)
}

pub fn load_borrowers_jsonl(path: &Path) -> Result<Vec<BorrowerProfile>> {
    load_jsonl(path)
}

fn load_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path).map_err(|e| data_error(path, e.to_string()))?;

    let rows = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|e| data_error(path, format!("line {}: {}", i + 1, e)))
        })
        .collect::<Result<Vec<T>>>()?;

    debug!(path = %path.display(), rows = rows.len(), "Loaded JSON lines");
    Ok(rows)
}

fn csv_error(path: &Path, err: csv::Error) -> PipelineError {
    match err.position() {
        Some(pos) => data_error(path, format!("line {}: {}", pos.line(), err)),
        None => data_error(path, err.to_string()),
    }
}

fn data_error(path: &Path, reason: String) -> PipelineError {
    PipelineError::DataError {
        path: path.display().to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;

    #[test]
    fn test_load_transactions_csv_optional_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tx.csv");
        std::fs::write(
            &path,
            "id,date,description,merchant,amount,type,account_id,category\n\
             t1,2024-03-01,Coffee,,4.5,debit,CHK,\n\
             t2,2024-03-02,Payroll,ACME,3000,credit,CHK,Income\n",
        )
        .unwrap();

        let rows = load_transactions_csv(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].merchant, None);
        assert_eq!(rows[0].category, None);
        assert_eq!(rows[1].kind, TransactionType::Credit);
        assert_eq!(rows[1].category.as_deref(), Some("Income"));
    }

    #[test]
    fn test_malformed_csv_row_names_file_and_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tx.csv");
        std::fs::write(
            &path,
            "id,date,description,merchant,amount,type,account_id,category\n\
             t1,2024-03-01,Coffee,,4.5,debit,CHK,\n\
             t2,2024-03-02,Payroll,ACME,lots,credit,CHK,Income\n",
        )
        .unwrap();

        match load_transactions_csv(&path).unwrap_err() {
            PipelineError::DataError { path: reported, reason } => {
                assert_eq!(reported, path.display().to_string());
                assert!(reason.starts_with("line 3"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_jsonl_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.jsonl");
        std::fs::write(
            &path,
            "{\"date\":\"2024-03-01\",\"term_months\":360,\"rate\":0.061}\n\n\
             {\"date\":\"2024-03-01\",\"term_months\":180,\"rate\":0.055}\n",
        )
        .unwrap();

        let rates = load_rates_jsonl(&path).unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[1].term_months, 180);
    }

    #[test]
    fn test_load_jsonl_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loans.jsonl");
        std::fs::write(&path, "{\"borrower_id\":\"B1\"}\n").unwrap();

        let err = load_loans_jsonl(&path).unwrap_err();
        match err {
            PipelineError::DataError { reason, .. } => assert!(reason.starts_with("line 1")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_borrowers_jsonl(Path::new("/nonexistent/borrowers.jsonl")).unwrap_err();
        assert!(matches!(err, PipelineError::DataError { .. }));
    }
}
