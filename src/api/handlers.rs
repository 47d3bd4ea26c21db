//! API Handlers
//!
//! HTTP request handlers for the catalog endpoints. Reads go through the
//! response cache; writes hit the repository and then clear the cache.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::api::rate_limit::ClientRateLimiter;
use crate::cache::{LocalCache, ResponseCache};
use crate::catalog::{build_query, PageRequest, SortSpec};
use crate::config::Config;
use crate::error::Result;
use crate::models::{
    DeleteResponse, HealthResponse, ListParams, NewProduct, ProductPage, ProductResponse,
    ProductUpdate, SearchParams, StatsResponse,
};
use crate::repository::ProductRepository;

const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn ProductRepository>,
    pub cache: Arc<dyn ResponseCache>,
    pub limiter: Arc<ClientRateLimiter>,
    pub config: Arc<Config>,
    pub started_at: Instant,
}

impl AppState {
    /// Builds state with an in-process response cache and a rate limiter
    /// sized from `config`.
    pub fn new(config: Config, repository: Arc<dyn ProductRepository>) -> Self {
        let cache = Arc::new(LocalCache::new(config.cache_max_entries, config.cache_ttl()));
        let limiter = Arc::new(ClientRateLimiter::new(
            config.rate_limit_max,
            config.rate_limit_window(),
        ));

        Self {
            repository,
            cache,
            limiter,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Swaps in a different cache implementation.
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    async fn invalidate(&self) {
        self.cache.clear().await;
    }
}

fn json_response(body: String, cache_status: &'static str) -> Response {
    (
        [(header::CONTENT_TYPE, "application/json"), (X_CACHE, cache_status)],
        body,
    )
        .into_response()
}

/// Serves the cached payload for `key`, or runs `load`, caches its JSON and
/// serves that. Errors from `load` are returned and never cached.
async fn cached<T, F, Fut>(state: &AppState, key: String, load: F) -> Result<Response>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Some(body) = state.cache.get(&key).await {
        debug!(%key, "Cache hit");
        return Ok(json_response(body, "HIT"));
    }

    let payload = load().await?;
    let body = serde_json::to_string(&payload)?;

    if let Err(e) = state
        .cache
        .set(key.clone(), body.clone(), state.config.cache_ttl())
        .await
    {
        warn!(%key, error = %e, "Response not cached");
    }

    Ok(json_response(body, "MISS"))
}

/// Handler for GET /products
///
/// Newest first, one page at a time.
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Response> {
    let page = PageRequest::from_params(
        params.page.as_deref(),
        params.limit.as_deref(),
        &state.config.pagination,
    )?;
    let key = format!("products:page={}:limit={}", page.page, page.limit);

    cached(&state, key, || async {
        let (products, total) = state
            .repository
            .list(page.skip(), page.limit, SortSpec::default())
            .await?;
        Ok(ProductPage {
            products,
            pagination: page.metadata(total),
        })
    })
    .await
}

/// Handler for GET /products/search
///
/// The cache key is built from the parsed query, so equivalent query
/// strings share an entry.
pub async fn search_products(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Response> {
    let (filter, sort) = build_query(&params)?;
    let page = PageRequest::from_params(
        params.page.as_deref(),
        params.limit.as_deref(),
        &state.config.pagination,
    )?;
    let key = format!("search:{}", serde_json::to_string(&(&filter, sort, page))?);

    cached(&state, key, || async {
        let (products, total) = state
            .repository
            .search(&filter, sort, page.skip(), page.limit)
            .await?;
        Ok(ProductPage {
            products,
            pagination: page.metadata(total),
        })
    })
    .await
}

/// Handler for GET /products/:id
pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Response> {
    let key = format!("product:{}", id);
    cached(&state, key, || state.repository.find_by_id(&id)).await
}

/// Handler for POST /products
pub async fn create_product(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<NewProduct>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let product = state.repository.create(input).await?;
    state.invalidate().await;

    Ok((StatusCode::CREATED, Json(ProductResponse::created(product))))
}

/// Handler for PATCH /products/:id
pub async fn update_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ValidatedJson(update): ValidatedJson<ProductUpdate>,
) -> Result<Json<ProductResponse>> {
    let product = state.repository.update_by_id(&id, update).await?;
    state.invalidate().await;

    Ok(Json(ProductResponse::updated(product)))
}

/// Handler for DELETE /products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<DeleteResponse>> {
    let deleted = state.repository.delete_by_id(&id).await?;
    state.invalidate().await;

    Ok(Json(DeleteResponse::new(deleted.id)))
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats().await))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        state.started_at.elapsed().as_secs_f64(),
        state.config.environment.as_str(),
    ))
}

/// Fallback for unknown routes.
pub async fn route_not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Route not found" })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::repository::InMemoryProductRepository;

    fn test_state() -> (AppState, Arc<InMemoryProductRepository>) {
        let repo = Arc::new(InMemoryProductRepository::new());
        let state = AppState::new(Config::default(), repo.clone());
        (state, repo)
    }

    fn lamp() -> NewProduct {
        NewProduct {
            name: "Lamp".to_string(),
            price: Some(20.0),
            ..Default::default()
        }
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_list_miss_then_hit() {
        let (state, repo) = test_state();
        repo.create(lamp()).await.unwrap();

        let first = list_products(State(state.clone()), ApiQuery(ListParams::default()))
            .await
            .unwrap();
        assert_eq!(first.headers()["x-cache"], "MISS");

        let second = list_products(State(state), ApiQuery(ListParams::default()))
            .await
            .unwrap();
        assert_eq!(second.headers()["x-cache"], "HIT");

        assert_eq!(body_string(first).await, body_string(second).await);
        assert_eq!(repo.read_count(), 1);
    }

    #[tokio::test]
    async fn test_create_clears_cache() {
        let (state, repo) = test_state();

        list_products(State(state.clone()), ApiQuery(ListParams::default()))
            .await
            .unwrap();
        assert_eq!(state.cache.stats().await.total_entries, 1);

        let (status, Json(body)) = create_product(State(state.clone()), ValidatedJson(lamp()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.product.name, "Lamp");
        assert_eq!(state.cache.stats().await.total_entries, 0);

        let response = list_products(State(state), ApiQuery(ListParams::default()))
            .await
            .unwrap();
        assert_eq!(response.headers()["x-cache"], "MISS");
        assert_eq!(repo.read_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_cache() {
        let (state, _repo) = test_state();
        list_products(State(state.clone()), ApiQuery(ListParams::default()))
            .await
            .unwrap();

        let missing = mongodb::bson::oid::ObjectId::new().to_hex();
        let result = delete_product(State(state.clone()), ApiPath(missing)).await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert_eq!(state.cache.stats().await.total_entries, 1);
    }

    #[tokio::test]
    async fn test_get_product_cached() {
        let (state, repo) = test_state();
        let product = repo.create(lamp()).await.unwrap();

        get_product(State(state.clone()), ApiPath(product.id.clone()))
            .await
            .unwrap();
        let response = get_product(State(state), ApiPath(product.id))
            .await
            .unwrap();

        assert_eq!(response.headers()["x-cache"], "HIT");
        assert_eq!(repo.read_count(), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let (state, _repo) = test_state();
        let missing = mongodb::bson::oid::ObjectId::new().to_hex();

        let result = get_product(State(state.clone()), ApiPath(missing)).await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert_eq!(state.cache.stats().await.total_entries, 0);
    }

    #[tokio::test]
    async fn test_search_rejects_bad_sort_field() {
        let (state, repo) = test_state();
        let params = SearchParams {
            sort_field: Some("password".to_string()),
            ..Default::default()
        };

        let result = search_products(State(state), ApiQuery(params)).await;

        assert!(matches!(result, Err(ApiError::Validation(_))));
        assert_eq!(repo.read_count(), 0);
    }

    #[tokio::test]
    async fn test_update_returns_new_values() {
        let (state, repo) = test_state();
        let product = repo.create(lamp()).await.unwrap();

        let Json(body) = update_product(
            State(state),
            ApiPath(product.id),
            ValidatedJson(ProductUpdate {
                price: Some(35.0),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(body.msg, "Product updated successfully");
        assert_eq!(body.product.price, Some(35.0));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let (state, _repo) = test_state();
        let response = health_handler(State(state)).await;
        assert_eq!(response.status, "OK");
        assert_eq!(response.environment, "development");
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let (state, _repo) = test_state();
        list_products(State(state.clone()), ApiQuery(ListParams::default()))
            .await
            .unwrap();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.stats.misses, 1);
        assert_eq!(response.stats.hits, 0);
    }
}
