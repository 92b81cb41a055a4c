//! Report output
//!
//! Reports are written once, after a pipeline has finished successfully.

use crate::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Write `report` as indented JSON to `path`, creating parent directories
pub fn dump_json<T: Serialize + ?Sized>(path: &Path, report: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let body = serde_json::to_string_pretty(report)?;
    fs::write(path, body)?;

    info!(path = %path.display(), "Report written");
    Ok(())
}

/// Write the report to disk and echo it to stdout
pub fn publish<T: Serialize + ?Sized>(path: &Path, report: &T) -> Result<()> {
    dump_json(path, report)?;
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
