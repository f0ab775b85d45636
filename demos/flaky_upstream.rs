//! Page content upstream that fails its first few requests.
//!
//! Run it, then start the service with `content.base_url` pointing here to
//! watch `/pages/{page_id}` retry through the 503s.
//!
//! ```text
//! cargo run --example flaky_upstream -- 2
//! ```

use axum::{extract::Path, extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Clone)]
struct Flaky {
    failures: u32,
    seen: Arc<AtomicU32>,
}

async fn page(State(flaky): State<Flaky>, Path(page_id): Path<String>) -> (StatusCode, Json<Value>) {
    let n = flaky.seen.fetch_add(1, Ordering::SeqCst);
    if n < flaky.failures {
        println!("request {} for {}: 503", n + 1, page_id);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "message": "Service Unavailable" })),
        );
    }
    println!("request {} for {}: 200", n + 1, page_id);
    (
        StatusCode::OK,
        Json(json!({ "id": page_id, "title": format!("Page {}", page_id) })),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let failures = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(2);
    let state = Flaky { failures, seen: Arc::new(AtomicU32::new(0)) };

    let app = Router::new()
        .route("/pages/{page_id}", get(page))
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 8081));
    println!("Flaky upstream listening on http://{} (failing first {} requests)", addr, failures);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
