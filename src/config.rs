//! Application configuration
//!
//! Read from the environment (a `.env` file is honoured by the binary).

use crate::error::PipelineError;
use crate::finance::DEFAULT_ALERT_THRESHOLD;
use crate::registry::DuplicatePolicy;
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub agents_registry: PathBuf,
    pub tools_registry: PathBuf,
    pub refi_threshold: f64,
    pub refi_term_months: Option<u32>,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("outputs"),
            agents_registry: PathBuf::from("config/agents.yml"),
            tools_registry: PathBuf::from("config/tools.yml"),
            refi_threshold: DEFAULT_ALERT_THRESHOLD,
            refi_term_months: None,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; unset or blank values keep
    /// their defaults
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("PIPELINE_DATA_DIR") {
            config.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("PIPELINE_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get("AGENTS_REGISTRY_PATH") {
            config.agents_registry = PathBuf::from(v);
        }
        if let Some(v) = get("TOOLS_REGISTRY_PATH") {
            config.tools_registry = PathBuf::from(v);
        }
        if let Some(v) = get("REFI_SAVINGS_THRESHOLD") {
            config.refi_threshold = parse_var("REFI_SAVINGS_THRESHOLD", &v)?;
        }
        if let Some(v) = get("REFI_TERM_MONTHS") {
            config.refi_term_months = Some(parse_var("REFI_TERM_MONTHS", &v)?);
        }
        if let Some(v) = get("REGISTRY_DUPLICATE_POLICY") {
            config.duplicate_policy = v.parse()?;
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| PipelineError::Config(format!("{}={}: {}", key, value, e)))
}
