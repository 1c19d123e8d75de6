use crate::models::api::ErrorResponse;
use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use tracing::debug;

pub async fn fallback_handler(uri: Uri) -> Response {
    debug!(path = %uri.path(), "Unknown endpoint requested");

    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            success: false,
            error: "Invalid endpoint. Valid endpoints: /torrentinfo, /health".to_string(),
        }),
    )
        .into_response()
}
