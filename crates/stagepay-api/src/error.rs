//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from stagepay-domain to HTTP status codes and
//! returns JSON error response bodies with error code, message, and
//! details. Never exposes internal error details in responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use stagepay_domain::{ReviewError, ReviewStatus, Violation};

/// Structured JSON error response body.
///
/// All error responses use this format. The `details` field carries the
/// violation list for readiness failures and is omitted otherwise.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "NOT_PENDING").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422). Covers both malformed request
    /// bodies and single-field business-rule failures: the client sent
    /// syntactically valid HTTP with semantically invalid content.
    #[error("validation error: {0}")]
    Validation(String),

    /// A readiness gate failed (422). Carries the accumulated violation
    /// list so the client can surface exactly which section needs
    /// attention.
    #[error("{count} readiness violation(s)", count = .0.len())]
    Violations(Vec<Violation>),

    /// Rejection attempted without a stated reason (422).
    #[error("review notes are required to reject")]
    NotesRequired,

    /// Transition attempted on a review that is not pending (409).
    #[error("review is {0}, not pending")]
    NotPending(ReviewStatus),

    /// Authentication failure — missing or invalid token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization failure — insufficient capability (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Violations(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::NotesRequired => (StatusCode::UNPROCESSABLE_ENTITY, "NOTES_REQUIRED"),
            Self::NotPending(_) => (StatusCode::CONFLICT, "NOT_PENDING"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        // Log server-side errors for operator visibility.
        if let Self::Internal(_) = &self {
            tracing::error!(error = %self, "internal server error");
        }

        let details = match &self {
            Self::Violations(violations) => Some(serde_json::json!({
                "violations": violations,
            })),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Convert review state-machine errors to API errors.
impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::NotPending { status } => Self::NotPending(status),
            ReviewError::NotesRequired => Self::NotesRequired,
        }
    }
}
