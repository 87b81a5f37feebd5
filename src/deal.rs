//! Deal context handed to every agent
//!
//! The engine treats the deal as opaque JSON. It is only ever serialized into
//! prompts, so no schema beyond "a JSON object" is enforced here.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealContext(Map<String, Value>);

impl DealContext {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a JSON value, which must be an object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(Error::Validation(format!(
                "deal context must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&content)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn deal_name(&self) -> Option<&str> {
        self.get("deal_name").and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
