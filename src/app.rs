//! Application state and HTTP router construction.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Database;
use crate::services::{AuthConfig, AuthService, RecommendationService};

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub auth: AuthService,
    pub recommender: RecommendationService,
}

impl AppState {
    pub fn new(config: Arc<Config>, db: Database) -> Self {
        let auth = AuthService::new(db.clone(), AuthConfig::from_config(&config));
        let recommender = RecommendationService::new(db.clone());
        Self {
            config,
            db,
            auth,
            recommender,
        }
    }
}

/// Build the full Axum router with CORS and request tracing applied.
/// Returns Router<()> (state fully applied) for use with axum::serve.
pub fn build_app(state: AppState) -> Router<()> {
    Router::new()
        .merge(crate::api::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
