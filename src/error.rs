//! Error types for the catalog API
//!
//! Provides unified error handling using thiserror.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Message returned in place of internal error detail outside development.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

// == Api Error Enum ==
/// Unified error type for the catalog API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or missing input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Request body over the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// No product exists for the given id
    #[error("Product not found: {0}")]
    NotFound(String),

    /// Connectivity or timeout failure talking to the document store
    #[error("Store error: {0}")]
    Store(String),

    /// Client exceeded its request quota
    #[error("Too many requests, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Full message of a 500 error, attached to the response so the
/// development-mode middleware can surface it.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "Invalid request", msg.clone()),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large", msg.clone())
            }
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "Product not found",
                format!("No product with id {}", msg),
            ),
            ApiError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests",
                format!("Retry after {} seconds", retry_after_secs),
            ),
            ApiError::Store(_) | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                GENERIC_ERROR_MESSAGE.to_string(),
            ),
        };

        let body = Json(json!({
            "error": error,
            "message": message,
        }));
        let mut response = (status, body).into_response();

        match self {
            ApiError::RateLimited { retry_after_secs } => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
            }
            ApiError::Store(_) | ApiError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                response.extensions_mut().insert(ErrorDetail(self.to_string()));
            }
            _ => {}
        }

        response
    }
}

// == Conversions ==
impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        ApiError::Store(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge(rejection.body_text());
        }
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let codes: Vec<&str> = errs.iter().map(|e| e.code.as_ref()).collect();
                format!("{}: {}", field, codes.join(", "))
            })
            .collect();
        fields.sort();
        ApiError::Validation(fields.join("; "))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

// == Cache Error Enum ==
/// Reasons a response could not be stored in the cache.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache key exceeds maximum length of {0} bytes")]
    KeyTooLong(usize),

    #[error("Cache value exceeds maximum size of {0} bytes")]
    ValueTooLarge(usize),
}

// == Result Type Alias ==
/// Convenience Result type for the catalog API.
pub type Result<T> = std::result::Result<T, ApiError>;
