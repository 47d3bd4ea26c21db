//! API Routes
//!
//! Configures the Axum router with the catalog endpoints and middleware stack.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_product, delete_product, get_product, health_handler, list_products,
    route_not_found, search_products, stats_handler, update_product, AppState,
};
use super::middleware::{expose_error_detail, handle_panic, request_timing, security_headers};
use super::rate_limit::rate_limit;

/// Largest accepted request body.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Liveness and process info
/// - `GET /cache/stats` - Response cache statistics
/// - `GET /products` - Paged product list
/// - `POST /products` - Create a product
/// - `GET /products/search` - Filtered, sorted, paged search
/// - `GET /products/:id` - Fetch one product
/// - `PATCH /products/:id` - Partial update
/// - `DELETE /products/:id` - Delete
///
/// # Middleware (outermost first)
/// Tracing, request timing, compression, CORS, security headers, rate
/// limiting, development error detail, panic recovery and the body limit.
pub fn create_router(state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new()
        .route("/health", get(health_handler))
        .route("/cache/stats", get(stats_handler))
        .route("/products", get(list_products).post(create_product))
        .route("/products/search", get(search_products))
        .route(
            "/products/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CatchPanicLayer::custom(handle_panic));

    if state.config.is_development() {
        router = router.layer(middleware::from_fn(expose_error_detail));
    }

    router
        .layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit,
        ))
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer(&state.config.allowed_origins))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(request_timing))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin for `*` (or nothing configured); otherwise the listed origins
/// with credentials allowed.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::repository::InMemoryProductRepository;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn create_test_app(config: Config) -> Router {
        let state = AppState::new(config, Arc::new(InMemoryProductRepository::new()));
        create_router(state)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app(Config::default());

        let response = app.oneshot(get_request("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app(Config::default());

        let response = app.oneshot(get_request("/cache/stats")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = create_test_app(Config::default());

        let response = app.oneshot(get_request("/nope")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let app = create_test_app(Config::default());
        let name = "a".repeat(BODY_LIMIT_BYTES + 1);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/products")
                    .header("content-type", "application/json")
                    .body(Body::from(format!(r#"{{"name":"{}"}}"#, name)))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_cors_explicit_origin() {
        let config = Config {
            allowed_origins: vec!["https://shop.example".to_string()],
            ..Config::default()
        };
        let app = create_test_app(config);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("origin", "https://shop.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://shop.example"
        );
        assert_eq!(response.headers()["access-control-allow-credentials"], "true");
    }
}
