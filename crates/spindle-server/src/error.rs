//! HTTP error type.
//!
//! Handlers return `Result<T, ApiError>`. The response body is always
//! `{"error": "<message>"}`. Only caller mistakes are reported in detail;
//! every other failure is logged in full and answered with a fixed
//! per-operation message.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use spindle_core::SpindleError;
use thiserror::Error;
use tracing::{error, info};

pub const INVALID_BODY: &str = "Invalid request body";

/// Operation a handler was performing, used for the 500 message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    List,
    Get,
    Delete,
    Stats,
}

impl Operation {
    fn failure_message(self) -> &'static str {
        match self {
            Operation::Create => "Failed to create task",
            Operation::List => "Failed to list tasks",
            Operation::Get => "Failed to get task",
            Operation::Delete => "Failed to delete task",
            Operation::Stats => "Failed to get task stats",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{}: {source}", .op.failure_message())]
    Internal {
        op: Operation,
        source: SpindleError,
    },
}

impl ApiError {
    pub fn missing_id() -> Self {
        ApiError::BadRequest("Task ID is required".to_owned())
    }

    /// Classify a service error raised while performing `op`.
    pub fn from_service(op: Operation, e: SpindleError) -> Self {
        match e {
            SpindleError::InvalidId(_) => ApiError::BadRequest("Invalid task ID format".to_owned()),
            SpindleError::NotFound(_) => ApiError::NotFound("Task not found".to_owned()),
            SpindleError::Validation(reason) => {
                info!(%reason, "rejected task request");
                ApiError::BadRequest(INVALID_BODY.to_owned())
            }
            source => ApiError::Internal { op, source },
        }
    }

    /// Adapter for `map_err`.
    pub fn during(op: Operation) -> impl Fn(SpindleError) -> Self {
        move |e| ApiError::from_service(op, e)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        info!(error = %rejection.body_text(), "rejected request body");
        ApiError::BadRequest(INVALID_BODY.to_owned())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal { op, source } => {
                error!(error = %source, "{}", op.failure_message());
                op.failure_message().to_owned()
            }
            ApiError::BadRequest(m) | ApiError::NotFound(m) => m,
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
