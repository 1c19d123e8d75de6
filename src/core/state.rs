// Application state (AppState)

use crate::core::config::Config;
use crate::fetcher::client::HttpTorrentFetcher;
use crate::fetcher::TorrentFetcher;
use crate::metrics::collector::Metrics;
use crate::resolver::torrent_info::TorrentInfoResolver;
use crate::stores::download_store::DownloadStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
///
/// Everything handlers touch lives here behind an `Arc`, so the state is
/// cheap to clone across tasks.
#[derive(Clone)]
pub struct AppState {
    /// Resolves torrent references into metadata
    pub resolver: Arc<TorrentInfoResolver>,

    /// Full downloads and in-flight metadata fetches
    pub downloads: Arc<DownloadStore>,

    /// Request counters
    pub metrics: Arc<Metrics>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let downloads = Arc::new(DownloadStore::new());

        let fetcher = HttpTorrentFetcher::new(&config.fetch, Arc::clone(&downloads))
            .context("Failed to create torrent fetcher")?;

        Ok(Self::with_fetcher(config, Arc::new(fetcher), downloads))
    }

    /// Build state around a specific fetcher
    pub fn with_fetcher(
        config: Config,
        fetcher: Arc<dyn TorrentFetcher>,
        downloads: Arc<DownloadStore>,
    ) -> Self {
        let resolver = TorrentInfoResolver::new(
            fetcher,
            downloads.clone(),
            Duration::from_secs(config.resolver.fetch_timeout),
            config.resolver.max_hops,
        );

        Self {
            resolver: Arc::new(resolver),
            downloads,
            metrics: Arc::new(Metrics::new()),
            config: Arc::new(config),
        }
    }
}
