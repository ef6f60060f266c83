use crate::domain::CanonicalDocument;
use crate::domain::document::{NAMESPACE_FIELD, SERVICE_FIELD};
use chrono::{DateTime, Utc};
use clickhouse::serde::chrono::datetime64::nanos;
use serde::{Deserialize, Serialize};

/// `level` value for strings outside the well-known set.
pub const UNKNOWN_LEVEL: i8 = -1;

/// One stored document. A collection is a table with this layout.
#[derive(clickhouse::Row, Serialize, Deserialize, Clone, Debug)]
pub struct DocumentRow {
    #[serde(with = "nanos")]
    pub timestamp: DateTime<Utc>, // DateTime64(9,'UTC')
    #[serde(rename = "type")]
    pub doc_type: String, // LowCardinality(String)
    pub level: i8,         // Int8, -1 when unknown or absent
    pub service: String,   // LowCardinality(String)
    pub namespace: String, // LowCardinality(String)
    pub document: String,  // String, full document as JSON
}

impl TryFrom<&CanonicalDocument> for DocumentRow {
    type Error = serde_json::Error;

    fn try_from(doc: &CanonicalDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            timestamp: doc.timestamp(),
            doc_type: doc.doc_type().to_string(),
            level: doc.known_level().map_or(UNKNOWN_LEVEL, |level| level.rank()),
            service: doc.get_str(SERVICE_FIELD).unwrap_or_default().to_string(),
            namespace: doc.get_str(NAMESPACE_FIELD).unwrap_or_default().to_string(),
            document: serde_json::to_string(doc)?,
        })
    }
}
