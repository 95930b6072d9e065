//! # HTTP API
//!
//! Router assembly and shared state.
//!
//! Layering, outermost first:
//! 1. `TraceLayer` and CORS
//! 2. per-IP rate limiting
//! 3. API version resolution (+ supported/deprecated version headers)
//! 4. on `/api/companies...` only: bearer auth, then the response cache

mod auth;
mod companies;
mod employees;
mod error;
mod http_cache;
mod negotiate;
mod rate_limit;
mod root;
mod versioning;

pub use auth::{Claims, create_token, decode_token};
pub use error::ApiError;
pub use http_cache::CachedResponse;
pub use rate_limit::{prune, spawn_pruner};
pub use versioning::ApiVersion;

use crate::config::AppConfig;
use axum::Router;
use axum::http::HeaderName;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use roster_core::StoreError;
use roster_core::cache::LruCache;
use roster_core::storage::Store;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared handler state. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub config: Arc<AppConfig>,
    pub limiter: Arc<DefaultKeyedRateLimiter<String>>,
    pub cache: Arc<Mutex<LruCache<String, CachedResponse>>>,
    started: Instant,
}

impl AppState {
    pub fn new(store: Store, config: AppConfig) -> Self {
        let quota = Quota::per_minute(config.rate_limit_per_minute);
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
            limiter: Arc::new(RateLimiter::keyed(quota)),
            cache: Arc::new(Mutex::new(LruCache::default())),
            started: Instant::now(),
        }
    }

    /// Whole seconds since the server started; the response cache's clock.
    pub fn tick(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Run a store call on the blocking pool.
    pub async fn with_store<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Store) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || f(&store)).await?;
        Ok(result?)
    }
}

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    let companies = Router::new()
        .route(
            "/api/companies",
            get(companies::list)
                .post(companies::create)
                .options(companies::options),
        )
        .route("/api/companies/collection", post(companies::create_collection))
        .route("/api/companies/collection/{ids}", get(companies::collection))
        .route(
            "/api/companies/{id}",
            get(companies::get_one)
                .put(companies::update)
                .delete(companies::delete),
        )
        .route(
            "/api/companies/{id}/employees",
            get(employees::list).post(employees::create),
        )
        .route(
            "/api/companies/{id}/employees/{employee_id}",
            get(employees::get_one)
                .put(employees::update)
                .patch(employees::patch)
                .delete(employees::delete),
        )
        .route("/api/{version}/companies", get(companies::list_versioned))
        .route_layer(from_fn_with_state(state.clone(), http_cache::cache_responses))
        .route_layer(from_fn_with_state(state.clone(), auth::require_auth));

    let open = Router::new()
        .route("/api", get(root::root))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static("x-pagination")]);

    open.merge(companies)
        .layer(from_fn(versioning::resolve_version))
        .layer(from_fn_with_state(state.clone(), rate_limit::limit_requests))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
