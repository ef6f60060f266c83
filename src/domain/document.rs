use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::domain::LogLevel;

/// One JSON object as received from the forwarder.
pub type RawRecord = Map<String, Value>;

pub const TIMESTAMP_FIELD: &str = "timestamp";
pub const TYPE_FIELD: &str = "type";
pub const LEVEL_FIELD: &str = "level";
pub const SERVICE_FIELD: &str = "service";
pub const NAMESPACE_FIELD: &str = "namespace";
pub const MESSAGE_FIELD: &str = "message";

/// Normalized log document, ready for storage.
///
/// Keeps every key of the raw record in arrival order. `timestamp` is always
/// present and rendered as RFC 3339 in UTC; the parsed value is held next to
/// the map so storage adapters do not have to re-parse it. `type` is always a
/// string.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalDocument {
    timestamp: DateTime<Utc>,
    fields: Map<String, Value>,
}

impl CanonicalDocument {
    /// Assemble a document from normalized parts.
    ///
    /// `fields` must already hold a string `type`; `timestamp` overwrites any
    /// `timestamp` key in place.
    pub(crate) fn from_parts(timestamp: DateTime<Utc>, mut fields: Map<String, Value>) -> Self {
        fields.insert(
            TIMESTAMP_FIELD.to_string(),
            Value::String(render_timestamp(timestamp)),
        );
        Self { timestamp, fields }
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn doc_type(&self) -> &str {
        self.fields
            .get(TYPE_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// The `level` value when it is a string.
    #[must_use]
    pub fn level(&self) -> Option<&str> {
        self.fields.get(LEVEL_FIELD).and_then(Value::as_str)
    }

    /// The `level` value when it is one of the well-known levels.
    #[must_use]
    pub fn known_level(&self) -> Option<LogLevel> {
        self.level().and_then(LogLevel::from_label)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl Serialize for CanonicalDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// RFC 3339 in UTC with as many fractional digits as needed (0, 3, 6 or 9).
#[must_use]
pub fn render_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
