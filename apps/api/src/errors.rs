use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::documents::DocumentRole;
use crate::prompts::{InputSlot, TaskKind};

/// Failure of a single task slot. Recovered at the slot boundary: the slot
/// records it and stays re-triggerable, the session carries on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    #[error("Unsupported {role} format: upload a .txt or .pdf file")]
    UnsupportedFormat { role: DocumentRole },

    #[error("Could not read the {role}: {message}")]
    DocumentReadFailure { role: DocumentRole, message: String },

    #[error("Missing input: {slot}")]
    MissingInput { slot: InputSlot },

    #[error("The language model backend is unavailable: {0}")]
    BackendUnavailable(String),

    #[error("The language model backend timed out")]
    BackendTimeout,

    #[error("The language model backend returned an unusable reply: {0}")]
    BackendMalformedReply(String),
}

impl TaskError {
    /// Stable machine-readable code, shared by the HTTP body and slot views.
    pub fn code(&self) -> &'static str {
        match self {
            TaskError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            TaskError::DocumentReadFailure { .. } => "DOCUMENT_READ_FAILURE",
            TaskError::MissingInput { .. } => "MISSING_INPUT",
            TaskError::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            TaskError::BackendTimeout => "BACKEND_TIMEOUT",
            TaskError::BackendMalformedReply(_) => "BACKEND_MALFORMED_REPLY",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            TaskError::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            TaskError::DocumentReadFailure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            TaskError::MissingInput { .. } => StatusCode::BAD_REQUEST,
            TaskError::BackendUnavailable(_) | TaskError::BackendMalformedReply(_) => {
                StatusCode::BAD_GATEWAY
            }
            TaskError::BackendTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    pub fn view(&self) -> ErrorView {
        ErrorView {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Serialized form of an error, as rendered in a result box.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorView {
    pub code: &'static str,
    pub message: String,
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("The {task} task is already running")]
    TaskInFlight { task: TaskKind },

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::TaskInFlight { .. } => {
                (StatusCode::CONFLICT, "TASK_IN_FLIGHT", self.to_string())
            }
            AppError::Task(e) => {
                tracing::warn!("Task failed: {e}");
                (e.status(), e.code(), e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_names_the_role() {
        let err = TaskError::UnsupportedFormat {
            role: DocumentRole::JobDescription,
        };
        assert_eq!(
            err.to_string(),
            "Unsupported job description format: upload a .txt or .pdf file"
        );
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_backend_errors_map_to_gateway_statuses() {
        assert_eq!(TaskError::BackendTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            TaskError::BackendUnavailable("refused".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            TaskError::BackendMalformedReply("empty".into()).code(),
            "BACKEND_MALFORMED_REPLY"
        );
    }

    #[test]
    fn test_task_in_flight_is_conflict() {
        let response = AppError::TaskInFlight {
            task: TaskKind::GiveFeedback,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_missing_input_is_bad_request() {
        let response = AppError::from(TaskError::MissingInput {
            slot: InputSlot::Answer,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
