use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::docker::RuntimeError;

/// User-visible failures on the HTTP surface. Everything else is recovered
/// locally inside the collection pass.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Docker socket not available")]
    RuntimeUnavailable,
    #[error("Service not found")]
    ServiceNotFound,
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::RuntimeUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::ServiceNotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Unavailable => Self::RuntimeUnavailable,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
