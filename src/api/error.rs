//! Unified API error handling
//!
//! This module provides a consistent error response format across all API endpoints.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::service::catalog::CatalogError;
use crate::service::evaluation::EvaluationError;

/// Standard error response format
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unique request ID for tracing
    pub request_id: String,
}

/// Unified API error type
///
/// All API endpoints should return `Result<T, ApiError>` for consistent error handling.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Scenario key not in the catalog (404)
    #[error("Scenario not found: {0}")]
    UnknownScenario(String),

    /// Bad request / validation error (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Judge could not be reached within the retry budget (502)
    #[error("Judge unavailable: {0}")]
    JudgeUnavailable(String),
}

impl ApiError {
    fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::UnknownScenario(_) => "unknown_scenario",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Internal(_) => "internal_error",
            ApiError::JudgeUnavailable(_) => "judge_unavailable",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) | ApiError::UnknownScenario(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::JudgeUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_type = self.error_type();
        let request_id = Uuid::new_v4().to_string();

        tracing::error!(
            error_type = error_type,
            status = status.as_u16(),
            request_id = %request_id,
            message = %self,
            "API error"
        );

        HttpResponse::build(status).json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            request_id,
        })
    }
}

// ============================================================================
// From conversions for service errors
// ============================================================================

impl From<EvaluationError> for ApiError {
    fn from(err: EvaluationError) -> Self {
        match err {
            EvaluationError::EvaluationFailed(e) => ApiError::JudgeUnavailable(e.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownScenario { .. } => ApiError::UnknownScenario(err.to_string()),
            CatalogError::UnknownAssessment(_) => ApiError::NotFound(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}
