//! Run trace for pipeline executions
//!
//! Every run records the payload fingerprint after each stage.

use crate::payload::Payload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub index: usize,
    pub stage: String,
    pub output_keys: Vec<String>,
    pub output_hash: String,
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub pipeline: String,
    pub input_hash: String,
    pub output_hash: String,
    pub stages: Vec<StageRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub execution_time_ms: u64,
}

impl RunRecord {
    pub fn start(pipeline: &str, input_hash: String) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pipeline: pipeline.to_string(),
            input_hash,
            output_hash: String::new(),
            stages: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
            execution_time_ms: 0,
        }
    }

    pub fn finish(&mut self, output_hash: String, execution_time_ms: u64) {
        self.output_hash = output_hash;
        self.execution_time_ms = execution_time_ms;
        self.finished_at = Some(Utc::now());
    }
}

/// SHA256 of a payload's JSON form
/// Streams serialization into the hasher
pub fn fingerprint(payload: &Payload) -> String {
    let mut hasher = Sha256::new();

    if serde_json::to_writer(&mut HashWriter(&mut hasher), payload).is_err() {
        return String::new();
    }

    hex::encode(hasher.finalize())
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
