//! Mapping from domain errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use shopcore::errors::CoreError;
use tracing::error;

/// Wrapper giving [`CoreError`] an HTTP rendering.
///
/// Every error body uses the same envelope as successful responses:
/// `{"success": false, "message": "..."}`. Storage and internal errors are
/// logged and returned as an opaque 500 so backend details never leak.
#[derive(Debug)]
pub struct ApiError(CoreError);

/// Handler result alias.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, self.0.to_string()),
            CoreError::ValidationFailed(_)
            | CoreError::InsufficientInventory { .. }
            | CoreError::EmptyCart
            | CoreError::InvalidTransition { .. } => (StatusCode::BAD_REQUEST, self.0.to_string()),
            CoreError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.0.to_string()),
            CoreError::Storage(_) | CoreError::Internal(_) => {
                error!(error = %self.0, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (
            status,
            Json(json!({ "success": false, "message": message })),
        )
            .into_response()
    }
}
