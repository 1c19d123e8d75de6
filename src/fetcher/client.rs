use super::{Fetched, TorrentFetcher};
use crate::core::config::FetchConfig;
use crate::core::error::FetchError;
use crate::models::reference::MagnetLink;
use crate::stores::download_store::DownloadStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header::LOCATION, StatusCode, Url};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const MAX_REDIRECTS: usize = 10;

/// Fetches torrents from disk and over HTTP, optionally through SOCKS5 proxies
pub struct HttpTorrentFetcher {
    /// Index 0 is the direct client, index `n` goes through the proxy for `n` hops
    clients: Vec<reqwest::Client>,
    max_torrent_size: u64,
    metadata_source: Option<String>,
    downloads: Arc<DownloadStore>,
}

impl HttpTorrentFetcher {
    pub fn new(config: &FetchConfig, downloads: Arc<DownloadStore>) -> Result<Self> {
        let mut clients = Vec::with_capacity(config.socks5_proxies.len() + 1);
        clients.push(build_client(config, None)?);

        for (index, proxy) in config.socks5_proxies.iter().enumerate() {
            let client = build_client(config, Some(proxy))
                .context(format!("Failed to configure proxy for {} hops", index + 1))?;
            clients.push(client);
        }

        Ok(Self {
            clients,
            max_torrent_size: config.max_torrent_size,
            metadata_source: config.metadata_source.clone(),
            downloads,
        })
    }

    fn client_for(&self, hops: u32) -> Result<&reqwest::Client, FetchError> {
        self.clients
            .get(hops as usize)
            .ok_or(FetchError::NoAnonymityRoute { hops })
    }

    /// Pick the single URL a magnet's metadata is fetched from
    fn metadata_url(&self, magnet: &MagnetLink) -> Result<Url, FetchError> {
        let exact_source = magnet
            .exact_sources
            .iter()
            .filter_map(|xs| Url::parse(xs).ok())
            .find(|url| matches!(url.scheme(), "http" | "https"));

        if let Some(url) = exact_source {
            return Ok(url);
        }

        let template = self
            .metadata_source
            .as_deref()
            .ok_or(FetchError::NoMetadataSource)?;

        let url = render_metadata_source(template, &magnet.info_hash.to_hex());
        Url::parse(&url).map_err(|e| FetchError::Unreachable(format!("{}: {}", url, e)))
    }

    /// Read a response body, enforcing the size limit while streaming
    async fn read_body(&self, mut response: reqwest::Response) -> Result<Vec<u8>, FetchError> {
        let limit = self.max_torrent_size;

        if response.content_length().is_some_and(|len| len > limit) {
            return Err(FetchError::TooLarge { limit });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Unreachable(e.to_string()))?
        {
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(FetchError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

fn build_client(config: &FetchConfig, proxy: Option<&String>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout))
        .user_agent(config.user_agent.clone())
        .redirect(redirect_policy());

    if let Some(proxy) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy).context("Invalid proxy URL")?);
    }

    builder.build().context("Failed to create HTTP client")
}

/// Follow HTTP redirects, but stop at a magnet link so the caller sees the 3xx
fn redirect_policy() -> reqwest::redirect::Policy {
    reqwest::redirect::Policy::custom(|attempt| {
        if attempt.url().scheme().eq_ignore_ascii_case("magnet") {
            attempt.stop()
        } else if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else {
            attempt.follow()
        }
    })
}

/// Substitute `{infohash}` (lowercase hex) and `{INFOHASH}` (uppercase hex)
pub fn render_metadata_source(template: &str, info_hash_hex: &str) -> String {
    template
        .replace("{infohash}", &info_hash_hex.to_lowercase())
        .replace("{INFOHASH}", &info_hash_hex.to_uppercase())
}

fn magnet_redirect(response: &reqwest::Response) -> Option<String> {
    if !response.status().is_redirection() {
        return None;
    }

    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .filter(|loc| loc.len() >= 7 && loc[..7].eq_ignore_ascii_case("magnet:"))
        .map(str::to_string)
}

#[async_trait]
impl TorrentFetcher for HttpTorrentFetcher {
    async fn fetch_file(&self, path: &Path) -> Result<Vec<u8>, FetchError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| FetchError::Io(format!("{}: {}", path.display(), e)))?;

        if metadata.len() > self.max_torrent_size {
            return Err(FetchError::TooLarge {
                limit: self.max_torrent_size,
            });
        }

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| FetchError::Io(format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), bytes = data.len(), "Read torrent file");

        Ok(data)
    }

    async fn fetch_url(&self, url: &Url, hops: u32) -> Result<Fetched, FetchError> {
        let client = self.client_for(hops)?;

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Unreachable(format!("{}: {}", url, e)))?;

        if let Some(magnet) = magnet_redirect(&response) {
            info!(url = %url, "Torrent URL redirected to magnet link");
            return Ok(Fetched::Magnet(magnet));
        }

        if !response.status().is_success() {
            warn!(url = %url, status = %response.status(), "Torrent URL returned error status");
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let body = self.read_body(response).await?;

        debug!(url = %url, hops, bytes = body.len(), "Fetched torrent from URL");

        Ok(Fetched::Bytes(body))
    }

    async fn fetch_metainfo(&self, magnet: &MagnetLink, hops: u32) -> Result<Option<Vec<u8>>, FetchError> {
        let client = self.client_for(hops)?;
        let url = self.metadata_url(magnet)?;

        let _request = self.downloads.begin_metainfo_request(magnet.info_hash);

        info!(
            info_hash = %magnet.info_hash,
            source = %url,
            hops,
            "Fetching metainfo for magnet link"
        );

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Unreachable(format!("{}: {}", url, e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(info_hash = %magnet.info_hash, "Metadata source has no entry");
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let body = self.read_body(response).await?;

        Ok((!body.is_empty()).then_some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::infohash::InfoHash;
    use crate::stores::download_store::DownloadRegistry;
    use std::io::Write;

    fn config() -> FetchConfig {
        FetchConfig {
            request_timeout: 5,
            max_torrent_size: 1024,
            metadata_source: None,
            socks5_proxies: Vec::new(),
            user_agent: "test".to_string(),
        }
    }

    fn magnet(exact_sources: Vec<String>) -> MagnetLink {
        MagnetLink {
            info_hash: InfoHash::new([0xab; 20]),
            display_name: None,
            trackers: Vec::new(),
            exact_sources,
            uri: "magnet:?xt=urn:btih:abababababababababababababababababababab".to_string(),
        }
    }

    #[test]
    fn test_render_metadata_source() {
        let hex = "abcdef0123456789abcdef0123456789abcdef01";
        assert_eq!(
            render_metadata_source("https://cache.example/{INFOHASH}.torrent", hex),
            "https://cache.example/ABCDEF0123456789ABCDEF0123456789ABCDEF01.torrent"
        );
        assert_eq!(
            render_metadata_source("https://cache.example/t/{infohash}", hex),
            format!("https://cache.example/t/{}", hex)
        );
    }

    #[test]
    fn test_metadata_url_prefers_exact_source() {
        let mut cfg = config();
        cfg.metadata_source = Some("https://cache.example/{infohash}.torrent".to_string());
        let fetcher = HttpTorrentFetcher::new(&cfg, Arc::new(DownloadStore::new())).unwrap();

        let url = fetcher
            .metadata_url(&magnet(vec![
                "urn:sha1:whatever".to_string(),
                "https://mirror.example/a.torrent".to_string(),
            ]))
            .unwrap();
        assert_eq!(url.as_str(), "https://mirror.example/a.torrent");

        let url = fetcher.metadata_url(&magnet(Vec::new())).unwrap();
        assert_eq!(
            url.as_str(),
            "https://cache.example/abababababababababababababababababababab.torrent"
        );
    }

    #[tokio::test]
    async fn test_magnet_without_source_fails_without_registering() {
        let store = Arc::new(DownloadStore::new());
        let fetcher = HttpTorrentFetcher::new(&config(), Arc::clone(&store)).unwrap();
        let link = magnet(Vec::new());

        let result = fetcher.fetch_metainfo(&link, 0).await;

        assert!(matches!(result, Err(FetchError::NoMetadataSource)));
        assert_eq!(store.pending_metainfo_requests(&link.info_hash), 0);
    }

    #[tokio::test]
    async fn test_hops_without_proxy_have_no_route() {
        let fetcher = HttpTorrentFetcher::new(&config(), Arc::new(DownloadStore::new())).unwrap();
        let url = Url::parse("http://127.0.0.1:9/a.torrent").unwrap();

        let result = fetcher.fetch_url(&url, 2).await;
        assert!(matches!(result, Err(FetchError::NoAnonymityRoute { hops: 2 })));
    }

    #[test]
    fn test_proxy_clients_are_indexed_by_hops() {
        let mut cfg = config();
        cfg.socks5_proxies = vec!["socks5://127.0.0.1:1080".to_string()];
        let fetcher = HttpTorrentFetcher::new(&cfg, Arc::new(DownloadStore::new())).unwrap();

        assert!(fetcher.client_for(0).is_ok());
        assert!(fetcher.client_for(1).is_ok());
        assert!(fetcher.client_for(2).is_err());
    }

    #[tokio::test]
    async fn test_fetch_file() {
        let fetcher = HttpTorrentFetcher::new(&config(), Arc::new(DownloadStore::new())).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"d4:infodee").unwrap();

        let data = fetcher.fetch_file(file.path()).await.unwrap();
        assert_eq!(data, b"d4:infodee");
    }

    #[tokio::test]
    async fn test_fetch_file_too_large() {
        let fetcher = HttpTorrentFetcher::new(&config(), Arc::new(DownloadStore::new())).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[b'x'; 2048]).unwrap();

        let result = fetcher.fetch_file(file.path()).await;
        assert!(matches!(result, Err(FetchError::TooLarge { limit: 1024 })));
    }

    #[tokio::test]
    async fn test_fetch_missing_file() {
        let fetcher = HttpTorrentFetcher::new(&config(), Arc::new(DownloadStore::new())).unwrap();

        let result = fetcher.fetch_file(Path::new("/nonexistent/file.torrent")).await;
        assert!(matches!(result, Err(FetchError::Io(_))));
    }
}
