//! `fluent-bridge healthcheck`: probe a running instance over HTTP.
//!
//! Distroless images have no curl, so the binary checks itself.

use crate::config::DEFAULT_HTTP_PORT;
use std::time::Duration;
use thiserror::Error;

const HEALTHCHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Error type for healthcheck failures
#[derive(Error, Debug)]
#[error("Healthcheck failed: {0}")]
pub struct HealthcheckError(String);

/// Perform a health check against `PORT`, or the default port when unset.
pub async fn healthcheck() -> Result<(), HealthcheckError> {
    let port = match std::env::var("PORT") {
        Ok(port) if !port.is_empty() => port
            .parse::<u16>()
            .map_err(|e| HealthcheckError(format!("Invalid PORT '{port}': {e}")))?,
        _ => DEFAULT_HTTP_PORT,
    };
    healthcheck_with_port(port).await
}

/// Perform a health check against a specific port
pub async fn healthcheck_with_port(port: u16) -> Result<(), HealthcheckError> {
    let client = reqwest::Client::builder()
        .timeout(HEALTHCHECK_TIMEOUT)
        .build()
        .map_err(|e| HealthcheckError(format!("Failed to create HTTP client: {e}")))?;

    let url = format!("http://127.0.0.1:{port}/healthz");

    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| HealthcheckError(format!("Request failed: {e}")))?;

    if resp.status().is_success() {
        Ok(())
    } else {
        Err(HealthcheckError(format!(
            "Health endpoint returned status: {}",
            resp.status()
        )))
    }
}
