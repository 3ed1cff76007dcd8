//! Error handling for the grocery order-fulfillment engine
//!
//! Implements the engine's error taxonomy: validation, not-found,
//! precondition-failed, ownership-violation, conflict and storage. All but
//! storage errors are caller-recoverable; only storage errors are transient,
//! and retrying is always the caller's decision.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::models::OrderError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors (rejected pre-read)
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    // Referenced entity absent
    #[error("Resource not found: {0}")]
    NotFound(String),

    // Operation attempted from an illegal state
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    // Actor mutating outside its authority
    #[error("Ownership violation: {0}")]
    OwnershipViolation(String),

    // Atomic conditional update matched zero records
    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    // Storage errors (transient, retry-eligible by the caller only)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::ItemNotFound(id) => AppError::NotFound(format!("Order item {}", id)),
            OrderError::UnknownBranch(id) => AppError::NotFound(format!("Branch {}", id)),
            OrderError::OwnershipViolation { .. } => {
                AppError::OwnershipViolation(err.to_string())
            }
            OrderError::NotAssignedPartner(_) => AppError::OwnershipViolation(err.to_string()),
            OrderError::AlreadyAssigned => AppError::Conflict {
                resource: "order".to_string(),
                message: err.to_string(),
            },
            OrderError::InvalidItemStatus(_) => AppError::ValidationError(err.to_string()),
            OrderError::IllegalTransition { .. }
            | OrderError::PreconditionFailed(_)
            | OrderError::Terminal(_) => AppError::PreconditionFailed(err.to_string()),
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
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
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
            AppError::PreconditionFailed(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "PRECONDITION_FAILED".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::OwnershipViolation(msg) => (
                StatusCode::FORBIDDEN,
                ErrorDetail {
                    code: "OWNERSHIP_VIOLATION".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::Conflict { resource, message } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONFLICT".to_string(),
                    message: message.clone(),
                    field: Some(resource.clone()),
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
