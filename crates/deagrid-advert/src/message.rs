//! Inbound advertisement payload.
//!
//! A node broadcasts its capacity as a JSON object:
//!
//! ```json
//! {
//!   "id": "staging-id",
//!   "stacks": ["stack-name"],
//!   "available_memory": 1024,
//!   "app_id_to_count": { "app_id": 2 }
//! }
//! ```
//!
//! Extra keys are tolerated. They stay in the raw payload but never feed
//! decision logic.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{AdvertError, AdvertResult};

/// Typed view of a node capacity broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertisementMessage {
    /// Unique id of the advertising node.
    pub id: String,
    /// Runtime stacks the node can host.
    pub stacks: Vec<String>,
    /// Free memory in MB as of the broadcast.
    pub available_memory: u64,
    /// Running instances per application id.
    pub app_id_to_count: HashMap<String, u64>,
}

impl AdvertisementMessage {
    /// Decode and validate a payload that has already been parsed as JSON.
    pub fn from_value(value: &Value) -> AdvertResult<Self> {
        let Some(object) = value.as_object() else {
            warn!(kind = json_kind(value), "rejected non-object advertisement");
            return Err(AdvertError::malformed(format!(
                "expected a JSON object, got {}",
                json_kind(value)
            )));
        };

        Ok(Self {
            id: field(object, "id")?,
            stacks: field(object, "stacks")?,
            available_memory: field(object, "available_memory")?,
            app_id_to_count: field(object, "app_id_to_count")?,
        })
    }

    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> AdvertResult<Self> {
        let value = parse_json(json.as_bytes())?;
        Self::from_value(&value)
    }

    /// Parse a JSON byte buffer (as delivered off the bus) and validate it.
    pub fn from_slice(bytes: &[u8]) -> AdvertResult<Self> {
        let value = parse_json(bytes)?;
        Self::from_value(&value)
    }
}

/// Parse raw bytes into a JSON value, mapping syntax errors to
/// [`AdvertError::MalformedAdvertisement`].
pub(crate) fn parse_json(bytes: &[u8]) -> AdvertResult<Value> {
    serde_json::from_slice(bytes).map_err(|e| {
        warn!(error = %e, "advertisement is not valid JSON");
        AdvertError::malformed(format!("invalid JSON: {e}"))
    })
}

/// Decode one required key, naming it in the error on failure.
fn field<T: DeserializeOwned>(object: &Map<String, Value>, name: &str) -> AdvertResult<T> {
    let Some(raw) = object.get(name) else {
        warn!(field = name, "advertisement missing field");
        return Err(AdvertError::malformed(format!("missing field `{name}`")));
    };
    T::deserialize(raw).map_err(|e| {
        warn!(field = name, error = %e, "advertisement field has wrong shape");
        AdvertError::malformed(format!("field `{name}`: {e}"))
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
