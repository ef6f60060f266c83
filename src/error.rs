use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::domain::EnvelopeError;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Failed to load configuration: {0}")]
    Config(String),

    #[error("Failed to bind to address {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] clickhouse::error::Error),

    #[error("Storage did not respond within {0:?}")]
    StorageTimeout(std::time::Duration),

    #[error("Failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Request-level failures of `POST /ingest`.
///
/// Response bodies are fixed strings; the underlying cause is logged where
/// the error is raised and never sent to the client.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("missing or invalid API key")]
    Unauthorized,

    #[error("request body is not valid JSON")]
    InvalidJson,

    #[error("request body is neither an object nor an array")]
    InvalidDataFormat,

    #[error("storage write failed")]
    Storage,
}

impl IngestError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidJson | Self::InvalidDataFormat => {
                StatusCode::BAD_REQUEST
            }
            Self::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn body(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Unauthorized",
            Self::InvalidJson => "Invalid JSON",
            Self::InvalidDataFormat => "Invalid data format",
            Self::Storage => "Database error",
        }
    }
}

impl From<EnvelopeError> for IngestError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Json(_) => Self::InvalidJson,
            EnvelopeError::UnsupportedShape(_) => Self::InvalidDataFormat,
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        (self.status(), self.body()).into_response()
    }
}
