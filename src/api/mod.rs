//! HTTP boundary: axum router, shared state and request logging.
//!
//! Every route except `/health` and `/auth/*` requires a bearer token.
//! Report and post views additionally require an analyst role.

mod access;
mod auth;
mod error;
mod locations;
mod posts;
mod queries;
mod reports;

pub use error::ApiError;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use anyhow::{anyhow, Result};
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::auth::TokenSigner;
use crate::config::Config;
use crate::feed::{LiveFeed, SharedFeed};
use crate::logging::log_request;
use crate::sample;
use crate::storage::StateStore;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<StateStore>>,
    pub signer: TokenSigner,
    pub feed: SharedFeed,
}

impl AppState {
    pub fn new(store: StateStore, signer: TokenSigner, feed: SharedFeed) -> Self {
        Self { store: Arc::new(Mutex::new(store)), signer, feed }
    }

    /// Opens and migrates the database, seeding sample data when enabled.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut store = StateStore::new(&config.sqlite_path)?;
        store.init()?;
        let feed = if config.seed_sample {
            sample::seed_store(&mut store)?;
            LiveFeed::with_posts(config.feed_capacity, sample::social_posts())
        } else {
            LiveFeed::new(config.feed_capacity)
        };
        let signer = TokenSigner::new(&config.token_secret, config.token_ttl_secs);
        Ok(Self::new(store, signer, feed.shared()))
    }

    pub(crate) fn store(&self) -> Result<MutexGuard<'_, StateStore>, ApiError> {
        self.store.lock().map_err(|_| ApiError::Internal(anyhow!("store lock poisoned")))
    }

    /// Runs `f` against the store outside of a request.
    pub fn with_store<T>(&self, f: impl FnOnce(&mut StateStore) -> Result<T>) -> Result<T> {
        let mut guard = self.store.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        f(&mut guard)
    }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let feed_len = state.feed.read().await.len();
    Json(json!({ "status": "ok", "feed": feed_len }))
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let started = Instant::now();
    let resp = next.run(req).await;
    log_request(&method, &path, resp.status().as_u16(), started.elapsed().as_secs_f64() * 1000.0);
    resp
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/query", post(queries::create_query))
        .route("/results/{query_id}", get(queries::results_for_query))
        .route("/locations", get(locations::list_locations).post(locations::create_location))
        .route(
            "/locations/{id}",
            get(locations::get_location)
                .put(locations::update_location)
                .delete(locations::delete_location),
        )
        .route("/reports", get(reports::list_reports).post(reports::create_report))
        .route("/reports/stats", get(reports::report_stats))
        .route("/posts", get(posts::list_posts))
        .route("/posts/stats", get(posts::post_stats))
        .layer(middleware::from_fn(log_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
