//! `/views/{slug}` handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::counter::Slug;
use crate::http::response::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewCount {
    pub slug: String,
    pub views: u64,
}

pub async fn get_views(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<ViewCount>, ApiError> {
    let slug = Slug::parse(&raw).map_err(|_| ApiError::InvalidSlug)?;
    let views = state
        .counter
        .get_views(&slug)
        .await
        .map_err(|e| ApiError::internal(&e, state.counter.environment()))?;

    Ok(Json(ViewCount { slug: raw, views }))
}

pub async fn increment_views(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<ViewCount>, ApiError> {
    let slug = Slug::parse(&raw).map_err(|_| ApiError::InvalidSlug)?;
    let views = state
        .counter
        .increment_views(&slug)
        .await
        .map_err(|e| ApiError::internal(&e, state.counter.environment()))?;

    tracing::debug!(slug = %slug, views, "View recorded");
    Ok(Json(ViewCount { slug: raw, views }))
}

/// `/views` and `/views/` carry no slug.
pub async fn missing_slug() -> ApiError {
    ApiError::InvalidSlug
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
