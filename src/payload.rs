//! Payload threaded through pipeline stages
//!
//! An open key/value bag. Stages read it by reference and return a fresh
//! payload, so no stage can mutate the view another stage received.

use crate::error::PipelineError;
use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Payload {
    fields: Map<String, Value>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of any serializable value
    pub fn with<T: Serialize>(mut self, key: impl Into<String>, value: T) -> Result<Self> {
        self.insert(key, value)?;
        Ok(self)
    }

    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<()> {
        self.fields.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Decode a required field on behalf of `stage`
    pub fn require<T: DeserializeOwned>(&self, stage: &str, key: &str) -> Result<T> {
        let value = self.fields.get(key).ok_or_else(|| PipelineError::MissingField {
            stage: stage.to_string(),
            key: key.to_string(),
        })?;

        decode(stage, key, value)
    }

    /// Decode an optional field; absent and `null` both read as `None`
    pub fn optional<T: DeserializeOwned>(&self, stage: &str, key: &str) -> Result<Option<T>> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decode(stage, key, value).map(Some),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

fn decode<T: DeserializeOwned>(stage: &str, key: &str, value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| PipelineError::InvalidField {
        stage: stage.to_string(),
        key: key.to_string(),
        reason: e.to_string(),
    })
}
