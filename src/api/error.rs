use std::any::Any;

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use issue_tracker_core::db::StoreError;
use serde_json::json;

use crate::upload::UploadError;

/// Every failure a handler can return, rendered as `{"detail": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("An unexpected server error occurred.")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Store(_) | Self::Upload(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<issue_tracker_core::Error> for ApiError {
    fn from(err: issue_tracker_core::Error) -> Self {
        use issue_tracker_core::Error;

        match err {
            Error::NotFound(msg) => Self::NotFound(msg),
            Error::Validation(msg) => Self::Validation(msg),
            Error::NothingToUpdate => Self::BadRequest(Error::NothingToUpdate.to_string()),
            Error::Store(store) => Self::Store(store),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        match err.status() {
            StatusCode::PAYLOAD_TOO_LARGE => Self::PayloadTooLarge(err.body_text()),
            StatusCode::BAD_REQUEST => Self::BadRequest(err.body_text()),
            _ => Self::Validation(err.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(cause) => tracing::error!(cause = %cause, "unhandled failure"),
            err if status.is_server_error() => tracing::error!(error = %err, "request failed"),
            err => tracing::debug!(error = %err, status = status.as_u16(), "request rejected"),
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Turns a handler panic into the generic 500 instead of dropping the connection.
pub(crate) fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let cause = payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    ApiError::Internal(cause).into_response()
}
