//! Error responses.
//!
//! Every failure is rendered as JSON with a stable `message`. Internal detail
//! is attached as `error` only in development.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::Display;

use crate::config::Environment;

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Request-level failure.
#[derive(Debug)]
pub enum ApiError {
    InvalidSlug,
    MethodNotAllowed,
    Forbidden,
    NotFound,
    ContentDisabled,
    Upstream { detail: Option<String> },
    Internal { detail: Option<String> },
}

fn detail(error: &impl Display, environment: Environment) -> Option<String> {
    if environment.is_development() {
        Some(error.to_string())
    } else {
        None
    }
}

impl ApiError {
    pub fn internal(error: &impl Display, environment: Environment) -> Self {
        ApiError::Internal {
            detail: detail(error, environment),
        }
    }

    pub fn upstream(error: &impl Display, environment: Environment) -> Self {
        ApiError::Upstream {
            detail: detail(error, environment),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidSlug => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::ContentDisabled => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            ApiError::InvalidSlug => "Invalid slug",
            ApiError::MethodNotAllowed => "Method not allowed",
            ApiError::Forbidden => "Debug endpoint disabled in production",
            ApiError::NotFound => "Not found",
            ApiError::ContentDisabled => "Page content source not configured",
            ApiError::Upstream { .. } => "Failed to fetch page content",
            ApiError::Internal { .. } => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        let error = match self {
            ApiError::Upstream { detail } | ApiError::Internal { detail } => detail,
            _ => None,
        };
        (status, Json(ErrorBody { message, error })).into_response()
    }
}
