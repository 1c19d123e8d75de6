// HTTP routes configuration

use crate::core::state::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Public endpoints
        .route("/torrentinfo", get(crate::handlers::torrentinfo::torrentinfo_handler))
        .route("/health", get(crate::handlers::health::health_handler))

        // Admin endpoints (require API key)
        .route("/metrics", get(crate::handlers::metrics::metrics_handler))
        .route("/downloads", get(crate::handlers::downloads::downloads_list_handler))
        .route("/downloads/add", get(crate::handlers::downloads::download_add_handler))
        .route("/downloads/remove", get(crate::handlers::downloads::download_remove_handler))

        // 404 fallback for all unmatched routes
        .fallback(crate::handlers::fallback::fallback_handler)

        .with_state(state)
}
