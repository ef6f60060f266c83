use serde_json::Value;
use thiserror::Error;

use crate::domain::RawRecord;

/// Why a request body could not be turned into records.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object or array, got {0}")]
    UnsupportedShape(&'static str),
}

/// Decode a request body into the raw records it carries.
///
/// An object is a batch of one. In an array, elements that are not objects
/// are dropped without error. Every other top-level shape is rejected.
pub fn decode_envelope(body: &[u8]) -> Result<Vec<RawRecord>, EnvelopeError> {
    let value: Value = serde_json::from_slice(body)?;
    match value {
        Value::Object(record) => Ok(vec![record]),
        Value::Array(elements) => Ok(elements
            .into_iter()
            .filter_map(|element| match element {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect()),
        other => Err(EnvelopeError::UnsupportedShape(shape_name(&other))),
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
