use crate::app::AppState;
use crate::app::state::IngestConfig;
use crate::domain::{CanonicalDocument, decode_envelope, normalize_at};
use crate::error::{BridgeError, IngestError};
use crate::port::DocumentStore;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use bytes::Bytes;
use chrono::Utc;
use std::time::Duration;
use tracing::{Span, error, info, instrument, warn};

/// Upper bound on reading the request body.
pub const BODY_READ_TIMEOUT: Duration = Duration::from_secs(5);
/// Upper bound on the storage round trip.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);
/// Largest request body accepted.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Optional target overrides from the query string.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestParams {
    pub db: Option<String>,
    pub collection: Option<String>,
}

impl IngestParams {
    /// Read `db` and `collection` from the query. A repeated parameter keeps
    /// its first value; unknown parameters are ignored.
    pub fn from_uri(uri: &Uri) -> Self {
        let pairs = match Query::<Vec<(String, String)>>::try_from_uri(uri) {
            Ok(Query(pairs)) => pairs,
            Err(e) => {
                warn!(error = %e, "Ignoring unparseable query string");
                return Self::default();
            }
        };

        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "db" => &mut params.db,
                "collection" => &mut params.collection,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    /// Pick the target, falling back to the configured defaults for absent or
    /// empty values.
    fn resolve<'a>(&'a self, config: &'a IngestConfig) -> (&'a str, &'a str) {
        let database =
            non_empty(self.db.as_deref()).unwrap_or(config.default_database.as_str());
        let collection =
            non_empty(self.collection.as_deref()).unwrap_or(config.default_collection.as_str());
        (database, collection)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Handler for POST /ingest
///
/// Accepts one JSON object or an array of them, normalizes each object and
/// stores the result with a single write.
#[instrument(skip_all, fields(database, collection, documents))]
pub async fn ingest_handler(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, &'static str), IngestError> {
    if !state.ingest.authenticate(&headers) {
        warn!("Rejected ingest request with missing or invalid API key");
        return Err(IngestError::Unauthorized);
    }

    let params = IngestParams::from_uri(&uri);
    let (database, collection) = params.resolve(&state.ingest);
    let span = Span::current();
    span.record("database", database);
    span.record("collection", collection);

    let body = read_body(body).await?;
    let records = decode_envelope(&body).map_err(|e| {
        warn!(error = %e, body_size = body.len(), "Failed to decode ingest payload");
        IngestError::from(e)
    })?;

    let now = Utc::now();
    let documents: Vec<CanonicalDocument> = records
        .into_iter()
        .map(|record| normalize_at(record, now))
        .collect();
    let count = documents.len();
    span.record("documents", count);

    if count == 0 {
        info!("No documents to store");
        return Ok((StatusCode::OK, "OK"));
    }

    if let Err(e) = write_documents(state.store.as_ref(), database, collection, documents).await {
        error!(error = %e, count, "Failed to insert logs");
        return Err(IngestError::Storage);
    }

    info!(count, "Inserted {count} logs into {database}.{collection}");
    Ok((StatusCode::OK, "OK"))
}

/// Handler for any other method on /ingest
pub async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

async fn read_body(body: Body) -> Result<Bytes, IngestError> {
    match tokio::time::timeout(BODY_READ_TIMEOUT, axum::body::to_bytes(body, MAX_BODY_BYTES)).await
    {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e)) => {
            warn!(error = %e, "Failed to read request body");
            Err(IngestError::InvalidJson)
        }
        Err(_) => {
            warn!(timeout = ?BODY_READ_TIMEOUT, "Timed out reading request body");
            Err(IngestError::InvalidJson)
        }
    }
}

/// Issue exactly one write for `documents`: `insert_one` for a single
/// document, `insert_many` otherwise. Nothing is written for an empty batch.
pub async fn write_documents(
    store: &dyn DocumentStore,
    database: &str,
    collection: &str,
    mut documents: Vec<CanonicalDocument>,
) -> Result<(), BridgeError> {
    let write = match documents.len() {
        0 => return Ok(()),
        1 => store.insert_one(database, collection, documents.swap_remove(0)),
        _ => store.insert_many(database, collection, documents),
    };

    tokio::time::timeout(WRITE_TIMEOUT, write)
        .await
        .map_err(|_| BridgeError::StorageTimeout(WRITE_TIMEOUT))?
}
