use serde::{Deserialize, Serialize};

/// Query parameters of `GET /torrentinfo`
///
/// Both fields stay raw strings so that validation can report precise errors
/// instead of axum's generic query rejection.
#[derive(Debug, Default, Deserialize)]
pub struct TorrentInfoQuery {
    pub uri: Option<String>,
    pub hops: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TorrentInfoResponse {
    /// Hex of the bencoded metainfo dictionary
    pub metainfo: String,
    pub infohash: String,
    pub download_exists: bool,
}

#[derive(Deserialize)]
pub struct ApiKeyQuery {
    pub api_key: String,
}

#[derive(Deserialize)]
pub struct DownloadAddQuery {
    pub api_key: String,
    pub infohash: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize)]
pub struct DownloadRemoveQuery {
    pub api_key: String,
    pub infohash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadEntry {
    pub infohash: String,
    pub name: String,
    pub added_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadListResponse {
    pub success: bool,
    pub downloads: Vec<DownloadEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
