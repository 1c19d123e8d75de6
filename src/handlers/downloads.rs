use crate::core::error::AdminError;
use crate::core::state::AppState;
use crate::models::api::{
    ApiKeyQuery, DownloadAddQuery, DownloadEntry, DownloadListResponse, DownloadRemoveQuery,
    SuccessResponse,
};
use crate::models::download::Download;
use crate::models::infohash::InfoHash;
use crate::utils::auth::require_api_key;
use crate::utils::time::current_timestamp;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

fn parse_info_hash(raw: &str) -> Result<InfoHash, AdminError> {
    InfoHash::from_hex(raw).map_err(|e| AdminError::InvalidParameter(e.to_string()))
}

/// List registered downloads
///
/// GET /downloads?api_key=<key>
pub async fn downloads_list_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApiKeyQuery>,
) -> Result<Response, AdminError> {
    require_api_key(&params.api_key, &state.config.admin.api_key, "downloads list")?;

    let downloads = state
        .downloads
        .list_downloads()
        .iter()
        .map(|d| DownloadEntry {
            infohash: d.info_hash.to_hex(),
            name: d.name.clone(),
            added_at: d.added_at,
        })
        .collect();

    Ok((
        StatusCode::OK,
        Json(DownloadListResponse {
            success: true,
            downloads,
        }),
    )
        .into_response())
}

/// Register a full download
///
/// GET /downloads/add?api_key=<key>&infohash=<hex>&name=<name>
pub async fn download_add_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DownloadAddQuery>,
) -> Result<Response, AdminError> {
    require_api_key(&params.api_key, &state.config.admin.api_key, "download add")?;

    let info_hash = parse_info_hash(&params.infohash)?;

    state
        .downloads
        .add_download(Download::new(info_hash, params.name.clone(), current_timestamp()));

    info!(info_hash = %info_hash, name = %params.name, "Download added");

    Ok((
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: "Download added successfully".to_string(),
        }),
    )
        .into_response())
}

/// Remove a full download
///
/// GET /downloads/remove?api_key=<key>&infohash=<hex>
pub async fn download_remove_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DownloadRemoveQuery>,
) -> Result<Response, AdminError> {
    require_api_key(&params.api_key, &state.config.admin.api_key, "download remove")?;

    let info_hash = parse_info_hash(&params.infohash)?;

    if state.downloads.remove_download(&info_hash).is_none() {
        warn!(info_hash = %info_hash, "Download not found");
        return Err(AdminError::NotFound("Download not found".to_string()));
    }

    info!(info_hash = %info_hash, "Download removed");

    Ok((
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: "Download removed successfully".to_string(),
        }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use crate::core::config::Config;
    use crate::core::routes::build_router;
    use crate::core::state::AppState;
    use crate::models::api::DownloadListResponse;
    use crate::models::infohash::InfoHash;
    use crate::stores::download_store::DownloadRegistry;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    const HASH: &str = "0123456789abcdef0123456789abcdef01234567";

    async fn get(state: &Arc<AppState>, path: &str) -> Response {
        build_router(Arc::clone(state))
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(Config::for_tests()).unwrap())
    }

    #[tokio::test]
    async fn test_add_requires_api_key() {
        let state = state();
        let path = format!("/downloads/add?api_key=wrong&infohash={}&name=x", HASH);

        let response = get(&state, &path).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(state.downloads.download_count(), 0);
    }

    #[tokio::test]
    async fn test_add_list_remove() {
        let state = state();
        let info_hash = InfoHash::from_hex(HASH).unwrap();

        let path = format!("/downloads/add?api_key=test-api-key&infohash={}&name=ubuntu", HASH.to_uppercase());
        assert_eq!(get(&state, &path).await.status(), StatusCode::OK);
        assert!(state.downloads.has_download(&info_hash));

        let response = get(&state, "/downloads?api_key=test-api-key").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let list: DownloadListResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(list.downloads.len(), 1);
        assert_eq!(list.downloads[0].infohash, HASH);
        assert_eq!(list.downloads[0].name, "ubuntu");

        let path = format!("/downloads/remove?api_key=test-api-key&infohash={}", HASH);
        assert_eq!(get(&state, &path).await.status(), StatusCode::OK);
        assert!(!state.downloads.has_download(&info_hash));
    }

    #[tokio::test]
    async fn test_remove_unknown_is_not_found() {
        let path = format!("/downloads/remove?api_key=test-api-key&infohash={}", HASH);
        let response = get(&state(), &path).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_add_with_bad_hash_is_bad_request() {
        let response = get(&state(), "/downloads/add?api_key=test-api-key&infohash=xyz").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
