//! Cross-cutting HTTP middleware
//!
//! Security headers, request timing, panic handling and development-mode
//! error detail.

use std::any::Any;
use std::time::Instant;

use axum::{
    body::Body,
    extract::Request,
    http::{
        header::{self, HeaderName},
        HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ApiError, ErrorDetail};

const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
const X_RESPONSE_TIME: HeaderName = HeaderName::from_static("x-response-time");

/// Requests slower than this are logged at warn.
const SLOW_REQUEST_MS: f64 = 1000.0;

/// Adds a helmet-style set of security headers to every response.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=15552000; includeSubDomains"),
    );
    headers.insert(header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off"));
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("0"));
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("x-permitted-cross-domain-policies"),
        HeaderValue::from_static("none"),
    );

    response
}

/// Stamps `X-Response-Time` and `X-Request-ID` and logs the request.
///
/// An incoming `X-Request-ID` is echoed back; otherwise a UUID v4 is issued.
pub async fn request_timing(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(&X_REQUEST_ID)
        .cloned()
        .or_else(|| HeaderValue::from_str(&Uuid::new_v4().to_string()).ok());

    let mut response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let status = response.status().as_u16();
    if elapsed_ms > SLOW_REQUEST_MS {
        warn!(%method, %path, status, elapsed_ms, "Slow request");
    } else {
        debug!(%method, %path, status, elapsed_ms, "Request served");
    }

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&format!("{:.2}ms", elapsed_ms)) {
        headers.insert(X_RESPONSE_TIME, value);
    }
    if let Some(id) = request_id {
        headers.insert(X_REQUEST_ID, id);
    }

    response
}

/// Replaces the generic 500 message with the underlying error text.
///
/// Only installed when running in development.
pub async fn expose_error_detail(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    let body = json!({
        "error": "Internal server error",
        "message": detail,
    });
    Response::from_parts(parts, Body::from(body.to_string()))
}

/// Turns a handler panic into a 500 response.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };

    ApiError::Internal(detail).into_response()
}
