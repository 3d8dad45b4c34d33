//! Model capability request/response types.
//!
//! The language model is consumed as a capability: given a prompt and a
//! JSON response schema it returns a structured object or fails with
//! [`ModelError`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON Schema constraining the model's structured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    /// Schema name passed to providers that require one (e.g. "ModelOutput").
    pub name: String,
    pub schema: serde_json::Value,
}

impl ResponseSchema {
    /// Generate a strict schema for `T`. See [`make_strict`].
    pub fn for_type<T: schemars::JsonSchema>(name: &str) -> Self {
        let schema = schemars::schema_for!(T);
        let mut schema = serde_json::to_value(schema).unwrap_or_default();
        make_strict(&mut schema);
        Self {
            name: name.to_string(),
            schema,
        }
    }
}

/// Rewrite a generated schema into the subset strict structured-output
/// modes accept.
///
/// Every object is closed with `additionalProperties: false` and lists all
/// of its properties as required, so optional fields must be nullable.
/// `oneOf` is spelled `anyOf`, and numeric `format` hints are dropped.
pub fn make_strict(value: &mut serde_json::Value) {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            if let Some(variants) = map.remove("oneOf") {
                map.insert("anyOf".to_string(), variants);
            }

            let is_numeric = map.get("type").is_some_and(|t| {
                let numeric = |v: &Value| v == "number" || v == "integer";
                numeric(t) || t.as_array().is_some_and(|a| a.iter().any(numeric))
            });
            if is_numeric {
                map.remove("format");
            }

            let is_object = map
                .get("type")
                .map(|t| t == "object" || t.as_array().is_some_and(|a| a.iter().any(|v| v == "object")))
                .unwrap_or(false);
            if is_object || map.contains_key("properties") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }
            if let Some(Value::Object(properties)) = map.get("properties") {
                let required = properties.keys().cloned().map(Value::String).collect();
                map.insert("required".to_string(), Value::Array(required));
            }

            for (_, child) in map.iter_mut() {
                make_strict(child);
            }
        }
        Value::Array(items) => {
            for item in items {
                make_strict(item);
            }
        }
        _ => {}
    }
}

/// A fully built request to the model capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    /// System instructions (persona, calendar, rules, schema description).
    pub system: String,
    /// User-facing content (history, data block, current message).
    pub user: String,
    pub response_schema: ResponseSchema,
    /// Upper bound the caller will wait for a response.
    pub timeout: Duration,
}

/// Raw structured output returned by the model capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// JSON text produced by the model. Validated by the caller.
    pub content: String,
    pub model: String,
}

/// Errors from the model capability.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    /// Output was missing, not JSON, or did not satisfy the response schema.
    #[error("malformed model output: {0}")]
    MalformedOutput(String),

    #[error("model provider error: {0}")]
    Provider(String),

    #[error("model provider rate limited")]
    RateLimited,

    #[error("model authentication failed: {0}")]
    Authentication(String),
}
