use crate::error::BridgeError;
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

/// Bind `0.0.0.0:<http_port>` and serve `app` until SIGINT or SIGTERM.
pub async fn serve(app: Router, http_port: u16) -> Result<(), BridgeError> {
    let bind_addr = format!("0.0.0.0:{http_port}");
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| BridgeError::Bind {
            address: bind_addr.clone(),
            source: e,
        })?;

    serve_until(listener, app, async {
        let reason = shutdown_signal().await;
        info!(signal = reason, "Initiating graceful shutdown");
    })
    .await
}

/// Serve on an already bound listener until `shutdown` resolves, then let
/// in-flight requests finish.
pub async fn serve_until<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<(), BridgeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(address = %listener.local_addr()?, "Listening for log ingestion");
    info!("  - POST /ingest            (JSON object or array)");
    info!("  - GET  /healthz, /health  (storage ping)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolve with the name of the first termination signal received.
///
/// A handler that fails to install never fires; the other one still can.
async fn shutdown_signal() -> &'static str {
    let interrupt = async {
        match signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                warn!(error = %e, "Failed to install SIGINT handler");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    }
}
