/*
 * Responsibility
 * - Shared AppError used by every middleware to terminate a request
 * - IntoResponse (HTTP status / body)
 * - CORS rejections answer with a plain-text body, everything else with the JSON envelope
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("Invalid Origin")]
    InvalidOrigin,

    #[error("Invalid HTTP Method")]
    InvalidMethod,

    #[error("Invalid HTTP Header")]
    InvalidHeader,

    #[error("service unavailable")]
    ServiceUnavailable,

    #[error("internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            // CORS clients get the literal reason, nothing else.
            AppError::InvalidOrigin | AppError::InvalidMethod | AppError::InvalidHeader => {
                return (StatusCode::FORBIDDEN, self.to_string()).into_response();
            }
            AppError::ServiceUnavailable => return StatusCode::SERVICE_UNAVAILABLE.into_response(),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}
