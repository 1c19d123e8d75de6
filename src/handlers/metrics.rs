// Metrics endpoint

use crate::core::error::MonitoringError;
use crate::core::state::AppState;
use crate::utils::auth::constant_time_eq;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub api_key: String,
}

/// Resolution counters, success rate, registry sizes and uptime
///
/// GET /metrics?api_key=<key>
pub async fn metrics_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MetricsQuery>,
) -> Result<Response, MonitoringError> {
    if !constant_time_eq(params.api_key.as_bytes(), state.config.admin.api_key.as_bytes()) {
        warn!("Unauthorized metrics access attempt");
        return Err(MonitoringError::InvalidApiKey);
    }

    let snapshot = state.metrics.get_snapshot(&state.downloads);

    Ok((StatusCode::OK, Json(snapshot)).into_response())
}
