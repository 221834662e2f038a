//! API error type mapped onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use foresight_runtime::RuntimeError;
use serde_json::json;
use thiserror::Error;

/// An error surfaced to API clients as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The referenced resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request was understood but rejected.
    #[error("{0}")]
    BadRequest(String),
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Validation(message) => Self::BadRequest(message),
            RuntimeError::WorkflowNotFound(id) => Self::NotFound(format!("unknown workflow: {id}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_errors_map_to_status_codes() {
        let not_found: ApiError = RuntimeError::WorkflowNotFound("wf_1".into()).into();
        assert!(matches!(not_found, ApiError::NotFound(_)));

        let bad: ApiError = RuntimeError::Validation("topic must not be empty".into()).into();
        assert!(matches!(bad, ApiError::BadRequest(_)));
    }
}
