use crate::config::Settings;
use crate::port::DocumentStore;
use axum::http::HeaderMap;
use std::sync::Arc;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Read-only request settings for `POST /ingest`.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub api_key: String,
    pub default_database: String,
    pub default_collection: String,
}

impl IngestConfig {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            default_database: settings.default_database.clone(),
            default_collection: settings.default_collection.clone(),
        }
    }

    /// Plain equality on the `X-API-Key` header.
    ///
    /// Not constant-time.
    #[must_use]
    pub fn authenticate(&self, headers: &HeaderMap) -> bool {
        headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|key| key == self.api_key)
    }
}

/// Shared application state: one store handle for every request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub ingest: Arc<IngestConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, ingest: IngestConfig) -> Self {
        Self {
            store,
            ingest: Arc::new(ingest),
        }
    }
}
