mod router;
pub mod server;
pub mod state;
pub mod tracing;

pub use router::router;
pub use state::{AppState, IngestConfig};

use crate::adapter::clickhouse::ClickHouseStore;
use crate::config;
use crate::error::BridgeError;
use crate::port::DocumentStore;
use std::sync::Arc;
use std::time::Duration;

/// How long the start-up connectivity check may take.
const STARTUP_PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Application entry point. Initializes tracing, configuration, and starts the server.
pub async fn run() -> Result<(), BridgeError> {
    // Handle healthcheck subcommand (for Docker healthcheck in distroless image)
    if std::env::args().nth(1).as_deref() == Some("healthcheck") {
        match crate::healthcheck().await {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1)
            }
        }
    }

    tracing::init_tracing();

    let settings = config::get_configuration()?;
    ::tracing::info!(
        database = %settings.default_database,
        collection = %settings.default_collection,
        "Loaded settings"
    );

    let store = ClickHouseStore::from_settings(&settings.storage);
    store.ping(STARTUP_PING_TIMEOUT).await?;
    ::tracing::info!(url = %settings.storage.url, "Connected to storage");
    store
        .ensure_collection(&settings.default_database, &settings.default_collection)
        .await?;

    let store: Arc<dyn DocumentStore> = Arc::new(store);
    let app_state = AppState::new(store, IngestConfig::from_settings(&settings));

    server::serve(router(app_state), settings.http_port).await
}
