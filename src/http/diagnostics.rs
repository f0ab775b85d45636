//! Storage diagnostics probe (`GET /views/debug`).
//!
//! Available in development, or anywhere when explicitly allowed. Reports
//! the backend the selector picks and, for networked KV only, runs a
//! write/read/delete cycle on a short-lived key.

use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::config::env::EnvPresence;
use crate::config::Environment;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::storage::BackendKind;

#[derive(Debug, Serialize)]
pub struct Diagnostics {
    pub environment: Environment,
    pub timestamp: String,
    pub storage: StorageReport,
}

#[derive(Debug, Serialize)]
pub struct StorageReport {
    #[serde(rename = "type")]
    pub kind: BackendKind,
    pub degraded: bool,
    pub kv: KvReport,
}

#[derive(Debug, Serialize)]
pub struct KvReport {
    pub configured: bool,
    pub client: Option<&'static str>,
    pub accessible: bool,
    pub error: Option<String>,
    pub env_vars: EnvPresence,
}

pub async fn storage_diagnostics(State(state): State<AppState>) -> Result<Json<Diagnostics>, ApiError> {
    let counter = &state.counter;
    let environment = counter.environment();
    if !environment.is_development() && !state.diagnostics.allow && !counter.env().allow_debug {
        return Err(ApiError::Forbidden);
    }

    let kind = counter.backend_kind();
    let mut kv = KvReport {
        configured: counter.env().has_kv_connection(),
        client: counter.kv().map(|kv| kv.client_name()),
        accessible: false,
        error: None,
        env_vars: counter.env().presence(),
    };

    match (kind, counter.kv()) {
        (BackendKind::NetworkedKv, Some(store)) => {
            let outcome = store.probe(&state.kv_config).await;
            kv.accessible = outcome.accessible;
            kv.error = outcome.error;
        }
        (BackendKind::NetworkedKv, None) => {
            kv.error = Some("KV configured but no client available".to_string());
        }
        (BackendKind::Memory, _) => {
            kv.error = Some("No KV environment variables found".to_string());
        }
        (BackendKind::File, _) => {}
    }

    Ok(Json(Diagnostics {
        environment,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        storage: StorageReport {
            kind,
            degraded: counter.is_degraded(),
            kv,
        },
    }))
}
