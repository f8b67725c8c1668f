//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how each
//! variant is rendered as an HTTP response.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use talentflow_core::{
    AnswerErrors, BuilderError, PortError, RuntimeError, SaveError, StructuralError,
};

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the document store port.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Assessment {0} is not published")]
    NotPublished(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A builder rule rejected the edit.
    #[error(transparent)]
    Builder(#[from] BuilderError),

    /// Per-question validation failures of a submission.
    #[error("{} answer(s) failed validation", .0.len())]
    InvalidAnswers(AnswerErrors),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl From<SaveError> for ApiError {
    fn from(err: SaveError) -> Self {
        match err {
            SaveError::Builder(e) => ApiError::Builder(e),
            SaveError::Port(e) => ApiError::Port(e),
        }
    }
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Persistence(e) => ApiError::Port(e),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

fn structural_details(errors: &[StructuralError]) -> Value {
    Value::Array(errors.iter().map(|e| Value::String(e.to_string())).collect())
}

fn answer_details(errors: &AnswerErrors) -> Value {
    let messages: BTreeMap<&str, String> = errors
        .iter()
        .map(|(question_id, e)| (question_id.as_str(), e.to_string()))
        .collect();
    json!(messages)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            ApiError::NotFound(_) | ApiError::Port(PortError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", None)
            }
            ApiError::Port(PortError::Conflict(_)) => (StatusCode::CONFLICT, "CONFLICT", None),
            ApiError::NotPublished(_) => (StatusCode::FORBIDDEN, "NOT_PUBLISHED", None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", None),
            ApiError::Builder(BuilderError::Published(_)) => {
                (StatusCode::CONFLICT, "ASSESSMENT_PUBLISHED", None)
            }
            ApiError::Builder(BuilderError::Structure(errors)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_STRUCTURE",
                Some(structural_details(errors)),
            ),
            ApiError::Builder(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_EDIT", None),
            ApiError::InvalidAnswers(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                Some(answer_details(errors)),
            ),
            _ => {
                tracing::error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None)
            }
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Server error".to_string()
        } else {
            self.to_string()
        };
        let mut error = json!({ "code": code, "message": message });
        if let Some(details) = details {
            error["details"] = details;
        }
        (status, Json(json!({ "error": error }))).into_response()
    }
}
