use crate::core::error::ResolveError;
use crate::core::state::AppState;
use crate::models::api::{TorrentInfoQuery, TorrentInfoResponse};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolve a torrent file, URL or magnet link into metainfo
///
/// GET /torrentinfo?uri=<uri>&hops=<n>
pub async fn torrentinfo_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TorrentInfoQuery>,
) -> Result<Response, ResolveError> {
    state.metrics.increment_requests();

    debug!(uri = ?params.uri, hops = ?params.hops, "Torrent info requested");

    let info = match state.resolver.resolve_params(params).await {
        Ok(info) => info,
        Err(e) => {
            state.metrics.record_failure(&e);
            warn!(error = %e, status = %e.status_code(), "Torrent info request failed");
            return Err(e);
        }
    };

    state.metrics.record_resolved(info.download_exists);

    Ok((
        StatusCode::OK,
        Json(TorrentInfoResponse {
            metainfo: hex::encode(info.metadata.to_bencode()),
            infohash: info.metadata.info_hash.to_hex(),
            download_exists: info.download_exists,
        }),
    )
        .into_response())
}
