use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for every operation in the backend. Each variant carries a
/// human-readable message and maps to exactly one HTTP status, so no failure
/// path is ambiguous to the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed required input; nothing was persisted.
    #[error("{0}")]
    Validation(String),

    /// Missing, malformed, or expired bearer token.
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated but not permitted: wrong role, not the resource owner,
    /// or not the assigned rider.
    #[error("{0}")]
    Authorization(String),

    /// The referenced order/restaurant/rider/user does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The resource is not in the expected state for the requested change;
    /// nothing was mutated.
    #[error("{0}")]
    Conflict(String),

    /// Persistence or transport failure, surfaced as a generic server error.
    /// Not retried here; the caller may retry.
    #[error("{0}")]
    Upstream(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        ApiError::Upstream(format!("storage error: {err}"))
    }
}

impl From<mongodb::bson::ser::Error> for ApiError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        ApiError::Upstream(format!("document encoding error: {err}"))
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Upstream(format!("password hashing error: {err}"))
    }
}
