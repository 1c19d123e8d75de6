pub mod client;

use crate::core::error::FetchError;
use crate::models::reference::MagnetLink;
use async_trait::async_trait;
use reqwest::Url;
use std::path::Path;

/// What a remote torrent URL turned out to serve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Bytes(Vec<u8>),
    /// The server redirected to a magnet link instead of serving a file
    Magnet(String),
}

/// Retrieves torrent data on behalf of the resolver
///
/// Implementations do not apply the resolver's overall timeout; the resolver
/// wraps every call in one.
#[async_trait]
pub trait TorrentFetcher: Send + Sync {
    async fn fetch_file(&self, path: &Path) -> Result<Vec<u8>, FetchError>;

    async fn fetch_url(&self, url: &Url, hops: u32) -> Result<Fetched, FetchError>;

    /// Obtain metadata for a magnet link: either a complete .torrent or a bare
    /// info dictionary. `Ok(None)` means the source had nothing for this hash.
    async fn fetch_metainfo(&self, magnet: &MagnetLink, hops: u32) -> Result<Option<Vec<u8>>, FetchError>;
}
