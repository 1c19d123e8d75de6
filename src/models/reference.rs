use crate::core::error::ValidationError;
use crate::models::infohash::InfoHash;
use reqwest::Url;
use std::path::PathBuf;

/// Where a torrent should be resolved from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TorrentReference {
    /// `file:` URI pointing at a local .torrent
    File(PathBuf),
    /// `http:` or `https:` URL serving a .torrent
    Url(Url),
    /// `magnet:` link naming the content by info hash
    Magnet(MagnetLink),
}

/// The parts of a magnet link the resolver cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagnetLink {
    pub info_hash: InfoHash,
    pub display_name: Option<String>,
    pub trackers: Vec<String>,
    /// `xs` exact sources: URLs that serve the .torrent directly
    pub exact_sources: Vec<String>,
    pub uri: String,
}

impl TorrentReference {
    /// Classify a URI by scheme and validate it
    pub fn parse(uri: &str) -> Result<Self, ValidationError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(ValidationError::MissingParameter("uri".to_string()));
        }

        let scheme = uri
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .ok_or_else(|| ValidationError::InvalidUri(uri.to_string()))?;

        match scheme.as_str() {
            "magnet" => MagnetLink::parse(uri).map(TorrentReference::Magnet),
            "http" | "https" => Url::parse(uri)
                .map(TorrentReference::Url)
                .map_err(|e| ValidationError::InvalidUri(format!("{}: {}", uri, e))),
            "file" => {
                let url =
                    Url::parse(uri).map_err(|e| ValidationError::InvalidUri(format!("{}: {}", uri, e)))?;
                url.to_file_path()
                    .map(TorrentReference::File)
                    .map_err(|_| ValidationError::InvalidUri(format!("{}: not a local file path", uri)))
            }
            _ => Err(ValidationError::InvalidUri(uri.to_string())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TorrentReference::File(_) => "file",
            TorrentReference::Url(_) => "url",
            TorrentReference::Magnet(_) => "magnet",
        }
    }
}

impl MagnetLink {
    pub fn parse(uri: &str) -> Result<Self, ValidationError> {
        let query = uri
            .get(..7)
            .filter(|scheme| scheme.eq_ignore_ascii_case("magnet:"))
            .map(|_| &uri[7..])
            .ok_or_else(|| ValidationError::InvalidUri(uri.to_string()))?;

        let query = query.strip_prefix('?').unwrap_or(query);

        let params: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| ValidationError::InvalidUri(format!("{}: {}", uri, e)))?;

        let mut info_hash = None;
        let mut display_name = None;
        let mut trackers = Vec::new();
        let mut exact_sources = Vec::new();

        for (key, value) in params {
            // Multi-valued keys may carry an index suffix: xt.1, tr.2
            let base = key.split('.').next().unwrap_or(&key);

            match base {
                "xt" => {
                    if info_hash.is_some() {
                        continue;
                    }
                    let btih = value
                        .get(..9)
                        .filter(|prefix| prefix.eq_ignore_ascii_case("urn:btih:"))
                        .map(|_| &value[9..]);
                    if let Some(btih) = btih {
                        info_hash = Some(InfoHash::from_btih(btih)?);
                    }
                }
                "dn" => display_name = Some(value),
                "tr" => {
                    if !trackers.contains(&value) {
                        trackers.push(value);
                    }
                }
                "xs" => exact_sources.push(value),
                _ => {}
            }
        }

        let info_hash = info_hash.ok_or(ValidationError::MissingInfoHash)?;

        Ok(Self {
            info_hash,
            display_name,
            trackers,
            exact_sources,
            uri: uri.to_string(),
        })
    }
}
