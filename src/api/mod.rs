//! API Module
//!
//! HTTP handlers, extractors, middleware and routing for the catalog REST API.
//!
//! # Endpoints
//! - `GET /products`, `POST /products`
//! - `GET /products/search`
//! - `GET|PATCH|DELETE /products/:id`
//! - `GET /cache/stats`
//! - `GET /health`

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod routes;

pub use extract::{ApiPath, ApiQuery, ValidatedJson};
pub use handlers::*;
pub use rate_limit::ClientRateLimiter;
pub use routes::create_router;
