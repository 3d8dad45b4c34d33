//! Application error type mapping to HTTP status codes and envelope format.

use axum::response::{IntoResponse, Response};

use super::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
///
/// Turn failures never surface here: the orchestrator always answers with a
/// result, degraded if need be.
#[derive(Debug)]
pub enum AppError {
    /// Unknown or expired session.
    SessionNotFound(String),
    Validation(String),
}

impl AppError {
    fn code_and_message(&self) -> (&'static str, String) {
        match self {
            AppError::SessionNotFound(id) => ("SESSION_NOT_FOUND", format!("Session '{id}' not found")),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = self.code_and_message();
        ApiResponse::error(code, &message, String::new(), 0).into_response()
    }
}
