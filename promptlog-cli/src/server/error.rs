use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use promptlog_lib::StoreError;
use thiserror::Error;
use tracing::error;

/// Errors returned by request handlers. Every variant renders as a JSON
/// `{"error": "..."}` body.
///
/// Client errors carry their full message. Storage errors map to 500 with a
/// fixed message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(StoreError::Validation { .. }) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Storage errors carry filesystem paths; keep those in the log only.
        let message = match &self {
            ApiError::Store(StoreError::NotFound { .. }) => "Not found".to_string(),
            ApiError::Store(e) if e.is_storage() => {
                error!(error = %e, "storage failure while handling request");
                "internal storage error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
