//! Error handling for the kitchen inventory service
//!
//! Every error maps to one status code and a JSON body. Storage failures are
//! reported opaquely; their detail only goes to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::LedgerRuleError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Referenced {resource} does not exist: {id}")]
    Referential { resource: String, id: String },

    #[error("Immutable field: {0}")]
    ImmutableField(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Database errors; any failure inside a transaction rolls the whole write back
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn referential(resource: impl Into<String>, id: impl ToString) -> Self {
        AppError::Referential {
            resource: resource.into(),
            id: id.to_string(),
        }
    }
}

impl From<LedgerRuleError> for AppError {
    fn from(err: LedgerRuleError) -> Self {
        match err {
            LedgerRuleError::Invalid { field, message } => AppError::validation(field, message),
            LedgerRuleError::UnknownMovementType(t) => {
                AppError::validation("type", format!("Unknown movement type: {}", t))
            }
            LedgerRuleError::ImmutableField(field) => AppError::ImmutableField(field.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        match fields.first() {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                AppError::validation(*field, message)
            }
            None => AppError::validation("body", "Invalid request"),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::Referential { resource, id } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "REFERENTIAL_ERROR".to_string(),
                    message: format!("{} {} does not exist", resource, id),
                    field: None,
                },
            ),
            AppError::ImmutableField(field) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "IMMUTABLE_FIELD".to_string(),
                    message: format!("{} cannot be changed after a movement is recorded", field),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "TRANSACTION_FAILED".to_string(),
                    message: "The operation could not be completed and was not applied. Please retry."
                        .to_string(),
                    field: None,
                },
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                },
            ),
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Rejected request: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
