//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics)
//! - Bind server to listener and drain on shutdown

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{any, get},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{DiagnosticsConfig, KvConfig, ServiceConfig};
use crate::content::PageFetcher;
use crate::counter::CounterService;
use crate::http::diagnostics::storage_diagnostics;
use crate::http::pages::get_page;
use crate::http::request::{record_metrics, request_id, UuidRequestId};
use crate::http::response::ApiError;
use crate::http::views::{get_views, increment_views, method_not_allowed, missing_slug};
use crate::lifecycle::shutdown::wait_for_signal;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub counter: Arc<CounterService>,
    pub pages: Option<Arc<PageFetcher>>,
    pub kv_config: Arc<KvConfig>,
    pub diagnostics: DiagnosticsConfig,
}

/// HTTP server for the view counter.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    pub fn new(config: ServiceConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/views", any(missing_slug))
            .route("/views/", any(missing_slug))
            .route(
                "/views/debug",
                get(storage_diagnostics).fallback(method_not_allowed),
            )
            .route(
                "/views/{slug}",
                get(get_views)
                    .post(increment_views)
                    .fallback(method_not_allowed),
            )
            .route("/pages/{page_id}", get(get_page).fallback(method_not_allowed))
            .fallback(not_found)
            .with_state(state)
            .layer(middleware::from_fn(record_metrics))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id(request),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The fully layered router, for serving or driving directly.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires or the process is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => tracing::info!("Shutdown requested"),
                    _ = wait_for_signal() => {}
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}
