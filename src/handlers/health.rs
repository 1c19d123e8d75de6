use crate::core::state::AppState;
use crate::utils::time::current_timestamp;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
    /// Proxied routes available beyond the direct one
    pub max_hops: u32,
    pub metadata_source_configured: bool,
}

/// Liveness plus the fetch routes this instance can serve
///
/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let fetch = &state.config.fetch;

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            timestamp: current_timestamp(),
            max_hops: fetch.socks5_proxies.len() as u32,
            metadata_source_configured: fetch.metadata_source.is_some(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use axum::body::Body;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_health_reports_fetch_routes() {
        let mut config = Config::for_tests();
        config.fetch.metadata_source = Some("https://cache.example/{infohash}.torrent".to_string());
        config.fetch.socks5_proxies = vec!["socks5://127.0.0.1:1080".to_string()];
        let state = Arc::new(AppState::new(config).unwrap());

        let response = health_handler(State(state)).await.into_response();
        let (parts, body) = response.into_parts();
        assert_eq!(parts.status, StatusCode::OK);

        let bytes = Body::new(body).collect().await.unwrap().to_bytes();
        let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(health.status, "ok");
        assert!(health.timestamp > 0);
        assert_eq!(health.max_hops, 1);
        assert!(health.metadata_source_configured);
    }
}
