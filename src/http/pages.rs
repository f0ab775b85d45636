//! `/pages/{page_id}`: upstream page content through retry-with-backoff.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::http::response::ApiError;
use crate::http::server::AppState;

pub async fn get_page(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let fetcher = state.pages.as_ref().ok_or(ApiError::ContentDisabled)?;

    match fetcher.fetch_page(&page_id).await {
        Ok(page) => Ok(Json(page)),
        Err(e) => {
            tracing::error!(page_id = %page_id, error = %e, "Page fetch failed");
            Err(ApiError::upstream(&e, state.counter.environment()))
        }
    }
}
