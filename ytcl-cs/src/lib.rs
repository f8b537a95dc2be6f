//! ytcl-cs library - Consensus Server module
//!
//! Hosts the consensus store, the voting engine, the labeling queue, and
//! the tiered classification resolver. The host client consumes
//! `resolve`/`should_hide` through [`AppState::resolver`] and the HTTP
//! surface; it never touches storage directly.

use axum::Router;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use ytcl_common::db::settings::get_setting;
use ytcl_common::Result;

pub mod api;
pub mod db;
pub mod engine;
pub mod queue;
pub mod resolver;

use engine::VotingEngine;
use queue::CandidateQueue;
use resolver::{ClassificationResolver, StaticFallbackDataset};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Shared secret for API authentication; empty disables auth
    pub api_token: String,
    /// Tiered classification resolver (overrides, consensus cache, fallback)
    pub resolver: Arc<ClassificationResolver>,
    /// Voting engine maintaining the per-channel consensus
    pub engine: Arc<VotingEngine>,
    /// Labeling queue handing voters unvoted channels
    pub queue: Arc<CandidateQueue>,
}

impl AppState {
    /// Create application state, reading tunables from the settings table
    pub async fn new(
        db: SqlitePool,
        api_token: String,
        fallback_dataset: PathBuf,
    ) -> Result<Self> {
        let cache_ttl_seconds = get_setting::<u64>(&db, "resolver_cache_ttl_seconds")
            .await?
            .unwrap_or(resolver::DEFAULT_CACHE_TTL.as_secs());
        let batch_size = get_setting::<i64>(&db, "candidate_batch_size")
            .await?
            .unwrap_or(queue::DEFAULT_BATCH_SIZE);

        let fallback = StaticFallbackDataset::new(fallback_dataset);
        let resolver = Arc::new(ClassificationResolver::new(
            db.clone(),
            fallback,
            Duration::from_secs(cache_ttl_seconds),
        ));
        let engine = Arc::new(VotingEngine::new(db.clone(), resolver.clone()));
        let queue = Arc::new(CandidateQueue::new(db.clone(), batch_size));

        Ok(Self {
            db,
            api_token,
            resolver,
            engine,
            queue,
        })
    }
}

/// Build application router
///
/// The health endpoint is public; everything else sits behind the shared
/// token middleware. CORS is permissive because the caller is a browser
/// extension on arbitrary origins.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/labeler/next", get(api::next_candidate))
        .route("/labeler/vote", post(api::submit_vote))
        .route("/classification", get(api::get_classification))
        .route("/channels/flagged", get(api::list_flagged_channels))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = api::health_routes();

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
