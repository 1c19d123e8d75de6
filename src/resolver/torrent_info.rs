use crate::core::error::{FetchError, ResolveError};
use crate::fetcher::{Fetched, TorrentFetcher};
use crate::models::api::TorrentInfoQuery;
use crate::models::metainfo::TorrentMetadata;
use crate::models::reference::{MagnetLink, TorrentReference};
use crate::stores::download_store::DownloadRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of a successful resolution
#[derive(Debug, Clone)]
pub struct TorrentInfo {
    pub metadata: TorrentMetadata,
    /// A full download for this info hash is already registered
    pub download_exists: bool,
}

/// Turns a torrent reference into metadata and checks it against known downloads
///
/// Holds no per-request state; every call does one fetch attempt, bounded by
/// `fetch_timeout`, and only reads the registry.
pub struct TorrentInfoResolver {
    fetcher: Arc<dyn TorrentFetcher>,
    registry: Arc<dyn DownloadRegistry>,
    fetch_timeout: Duration,
    max_hops: u32,
}

impl TorrentInfoResolver {
    pub fn new(
        fetcher: Arc<dyn TorrentFetcher>,
        registry: Arc<dyn DownloadRegistry>,
        fetch_timeout: Duration,
        max_hops: u32,
    ) -> Self {
        Self {
            fetcher,
            registry,
            fetch_timeout,
            max_hops,
        }
    }

    /// Validate raw request parameters, then resolve
    pub async fn resolve_params(&self, query: TorrentInfoQuery) -> Result<TorrentInfo, ResolveError> {
        let params = query.validate(self.max_hops)?;
        self.resolve(params.reference, params.hops).await
    }

    /// Resolve a reference within a single `fetch_timeout` deadline
    ///
    /// The deadline covers every fetch a reference needs, including a URL that
    /// redirects to a magnet link.
    pub async fn resolve(&self, reference: TorrentReference, hops: u32) -> Result<TorrentInfo, ResolveError> {
        debug!(kind = reference.kind(), hops, "Resolving torrent reference");

        let metadata = tokio::time::timeout(self.fetch_timeout, self.fetch_metadata(reference, hops))
            .await
            .map_err(|_| {
                warn!(timeout_secs = self.fetch_timeout.as_secs(), "Fetch timed out");
                FetchError::Timeout {
                    secs: self.fetch_timeout.as_secs(),
                }
            })??;

        let download_exists = self.registry.has_download(&metadata.info_hash);

        info!(
            info_hash = %metadata.info_hash,
            name = %metadata.name,
            files = metadata.files.len(),
            download_exists,
            "Torrent resolved"
        );

        Ok(TorrentInfo {
            metadata,
            download_exists,
        })
    }

    async fn fetch_metadata(&self, reference: TorrentReference, hops: u32) -> Result<TorrentMetadata, ResolveError> {
        let metadata = match reference {
            TorrentReference::File(path) => {
                let data = self.fetcher.fetch_file(&path).await?;
                TorrentMetadata::from_bytes(&data)?
            }
            TorrentReference::Url(url) => match self.fetcher.fetch_url(&url, hops).await? {
                Fetched::Bytes(data) => TorrentMetadata::from_bytes(&data)?,
                Fetched::Magnet(uri) => {
                    let magnet = MagnetLink::parse(&uri)
                        .map_err(|e| FetchError::InvalidRedirect(format!("{}: {}", uri, e)))?;
                    self.fetch_magnet(&magnet, hops).await?
                }
            },
            TorrentReference::Magnet(magnet) => self.fetch_magnet(&magnet, hops).await?,
        };

        Ok(metadata)
    }

    async fn fetch_magnet(&self, magnet: &MagnetLink, hops: u32) -> Result<TorrentMetadata, FetchError> {
        let data = self
            .fetcher
            .fetch_metainfo(magnet, hops)
            .await?
            .ok_or_else(|| FetchError::NoMetainfo(magnet.info_hash.to_hex()))?;

        let metadata =
            TorrentMetadata::from_bytes_or_info(&data, &magnet.trackers, magnet.display_name.as_deref())
                .map_err(|e| {
                    warn!(info_hash = %magnet.info_hash, error = %e, "Fetched metainfo is invalid");
                    FetchError::InvalidMetainfo(e.to_string())
                })?;

        if metadata.info_hash != magnet.info_hash {
            return Err(FetchError::InfoHashMismatch {
                expected: magnet.info_hash.to_hex(),
                actual: metadata.info_hash.to_hex(),
            });
        }

        Ok(metadata)
    }
}
