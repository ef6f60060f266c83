//! Turns one raw forwarder record into a [`CanonicalDocument`].
//!
//! The steps run in a fixed order and later steps overwrite what earlier
//! ones wrote:
//!
//! 1. copy every input key
//! 2. resolve `timestamp` from `@timestamp`, falling back to "now"
//! 3. lift `kubernetes.container_name` / `kubernetes.namespace_name` to
//!    `service` / `namespace`
//! 4. expand a JSON object embedded in `log`, or store the line as `message`
//! 5. default `type` to `"log"`
//! 6. lower-case a string `level`
//!
//! Nothing here fails. Malformed sub-fields skip their step and the raw value
//! stays in the document.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::domain::document::{
    CanonicalDocument, LEVEL_FIELD, MESSAGE_FIELD, NAMESPACE_FIELD, RawRecord, SERVICE_FIELD,
    TIMESTAMP_FIELD, TYPE_FIELD,
};

/// Forwarder-supplied event time.
pub const FORWARDER_TIMESTAMP_FIELD: &str = "@timestamp";
/// Container metadata attached by the Kubernetes filter.
pub const PLATFORM_METADATA_FIELD: &str = "kubernetes";
pub const CONTAINER_NAME_FIELD: &str = "container_name";
pub const NAMESPACE_NAME_FIELD: &str = "namespace_name";
/// Raw log line as read from the container runtime.
pub const LOG_LINE_FIELD: &str = "log";
/// Holds an embedded `timestamp` that could not be parsed.
pub const TIMESTAMP_RAW_FIELD: &str = "timestamp_raw";

pub const DEFAULT_TYPE: &str = "log";

/// Normalize using the current wall-clock time as the fallback timestamp.
#[must_use]
pub fn normalize(raw: RawRecord) -> CanonicalDocument {
    normalize_at(raw, Utc::now())
}

/// Normalize with an explicit fallback time.
#[must_use]
pub fn normalize_at(raw: RawRecord, now: DateTime<Utc>) -> CanonicalDocument {
    let mut fields = raw;

    let mut timestamp = resolve_timestamp(&fields, now);
    fields.insert(TIMESTAMP_FIELD.to_string(), Value::Null);

    extract_platform_metadata(&mut fields);

    if let Some(embedded) = expand_log_line(&mut fields) {
        // A parseable embedded timestamp wins over the forwarder's.
        if let Some(parsed) = embedded.as_str().and_then(parse_timestamp) {
            timestamp = parsed;
        } else {
            // A `timestamp_raw` carried by the record itself is kept.
            fields.entry(TIMESTAMP_RAW_FIELD).or_insert(embedded);
        }
    }

    default_type(&mut fields);
    lowercase_level(&mut fields);

    CanonicalDocument::from_parts(timestamp, fields)
}

fn resolve_timestamp(fields: &Map<String, Value>, now: DateTime<Utc>) -> DateTime<Utc> {
    fields
        .get(FORWARDER_TIMESTAMP_FIELD)
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
        .unwrap_or(now)
}

/// Parse an RFC 3339 timestamp with up to nanosecond precision.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn extract_platform_metadata(fields: &mut Map<String, Value>) {
    let Some(Value::Object(metadata)) = fields.get(PLATFORM_METADATA_FIELD) else {
        return;
    };

    let service = metadata
        .get(CONTAINER_NAME_FIELD)
        .and_then(Value::as_str)
        .map(str::to_owned);
    let namespace = metadata
        .get(NAMESPACE_NAME_FIELD)
        .and_then(Value::as_str)
        .map(str::to_owned);

    if let Some(service) = service {
        fields.insert(SERVICE_FIELD.to_string(), Value::String(service));
    }
    if let Some(namespace) = namespace {
        fields.insert(NAMESPACE_FIELD.to_string(), Value::String(namespace));
    }
}

/// Merge an embedded JSON object from `log`, or store the trimmed line as
/// `message`.
///
/// Returns the embedded `timestamp` value, if the object carried one. It is
/// left to the caller so the typed timestamp and the rendered field stay in
/// sync.
fn expand_log_line(fields: &mut Map<String, Value>) -> Option<Value> {
    let line = match fields.get(LOG_LINE_FIELD) {
        Some(Value::String(line)) => line.trim().to_owned(),
        _ => return None,
    };

    match parse_embedded_object(&line) {
        Some(embedded) => {
            let mut embedded_timestamp = None;
            for (key, value) in embedded {
                if key == TIMESTAMP_FIELD {
                    embedded_timestamp = Some(value);
                } else {
                    fields.insert(key, value);
                }
            }
            embedded_timestamp
        }
        None => {
            fields.insert(MESSAGE_FIELD.to_string(), Value::String(line));
            None
        }
    }
}

fn parse_embedded_object(line: &str) -> Option<Map<String, Value>> {
    if !(line.starts_with('{') && line.ends_with('}')) {
        return None;
    }
    serde_json::from_str::<Map<String, Value>>(line).ok()
}

fn default_type(fields: &mut Map<String, Value>) {
    let replacement = match fields.get(TYPE_FIELD) {
        Some(Value::String(_)) => return,
        None | Some(Value::Null) => Value::String(DEFAULT_TYPE.to_string()),
        // Keep the information, but as a string.
        Some(other) => Value::String(other.to_string()),
    };
    fields.insert(TYPE_FIELD.to_string(), replacement);
}

fn lowercase_level(fields: &mut Map<String, Value>) {
    if let Some(Value::String(level)) = fields.get_mut(LEVEL_FIELD) {
        *level = level.to_lowercase();
    }
}
