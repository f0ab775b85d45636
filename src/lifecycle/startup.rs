//! Startup orchestration.
//!
//! Order: stores and clients from config + environment, then the HTTP
//! server, then the listener. Any error before the listener is bound is
//! fatal.

use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ServiceConfig, StorageEnv};
use crate::content::{FetchError, PageFetcher};
use crate::counter::CounterService;
use crate::http::{AppState, HttpServer};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::storage::KvError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to configure networked KV: {0}")]
    Kv(#[from] KvError),

    #[error("failed to configure page content source: {0}")]
    Content(#[from] FetchError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Construct the shared handler state.
pub fn build_state(config: &ServiceConfig, env: StorageEnv) -> Result<AppState, StartupError> {
    let counter = CounterService::from_config(config, env)?;
    let pages = PageFetcher::from_config(&config.content, &config.retry)?;

    let backend = counter.backend_kind();
    tracing::info!(
        environment = %counter.environment(),
        backend = %backend,
        file_path = %config.storage.file_path,
        pages_enabled = pages.is_some(),
        "Counter storage selected"
    );
    metrics::set_degraded(counter.is_degraded());

    Ok(AppState {
        counter: Arc::new(counter),
        pages: pages.map(Arc::new),
        kv_config: Arc::new(config.kv.clone()),
        diagnostics: config.diagnostics.clone(),
    })
}

/// Build everything and serve on the configured address until shutdown.
pub async fn run(config: ServiceConfig, env: StorageEnv, shutdown: &Shutdown) -> Result<(), StartupError> {
    let state = build_state(&config, env)?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, state);
    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
