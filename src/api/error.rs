//! HTTP error mapping
//!
//! Every failing route answers with a JSON `ErrorBody`. The status and
//! wording depend on the error category and on which route failed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::core::features::completion::provider::MALFORMED_COMPLETION;
use crate::shared::error::AppError;
use crate::shared::types::ErrorBody;

/// Which route an error came from; decides the catch-all wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Convert,
    Explain,
}

impl Operation {
    fn internal_error(&self) -> &'static str {
        match self {
            Operation::Convert => "Internal server error during code conversion",
            Operation::Explain => "Internal server error during explanation",
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                ..Default::default()
            },
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Endpoint not found")
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        let mut err = Self::new(StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred");
        err.body.message = Some(message.into());
        err
    }

    pub fn invalid_json(status: StatusCode, message: impl Into<String>) -> Self {
        let mut err = Self::new(status, "Invalid JSON body");
        err.body.message = Some(message.into());
        err
    }

    /// Map a proxy failure for the given route
    pub fn from_app(err: AppError, operation: Operation) -> Self {
        match err {
            AppError::Validation(message) => Self::bad_request(message),
            AppError::Provider {
                status,
                message,
                details,
            } => {
                // Mirror the provider's status so clients see e.g. 429 as-is
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                let mut api = Self::new(status, message);
                api.body.details = details;
                api
            }
            AppError::MalformedResponse(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, MALFORMED_COMPLETION)
            }
            other => {
                let mut api = Self::new(StatusCode::INTERNAL_SERVER_ERROR, operation.internal_error());
                api.body.message = Some(other.message().to_string());
                api
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
