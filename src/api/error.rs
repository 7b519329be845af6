use axum::{http::StatusCode, response::IntoResponse};

use crate::errors::Error;

/// HTTP-facing error.
///
/// Issuance-path failures carry no body so nothing about the backend, template or
/// filesystem leaks to the caller; the detail is in the server log. Health probe
/// failures are the exception and return their error text.
#[derive(Debug)]
pub enum ApiError {
    Forbidden,
    Internal,
    Diagnostic(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal | ApiError::Diagnostic(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        match self {
            ApiError::Forbidden | ApiError::Internal => status.into_response(),
            ApiError::Diagnostic(message) => (status, message).into_response(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Forbidden(_) => ApiError::Forbidden,
            Error::Probe(_) => ApiError::Diagnostic(err.to_string()),
            _ => ApiError::Internal,
        }
    }
}
