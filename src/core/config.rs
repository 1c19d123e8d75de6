use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub unix_socket: Option<PathBuf>,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Upper bound in seconds for a single fetch, magnet metadata included
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: u64,
    #[serde(default = "default_max_hops")]
    pub max_hops: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_max_torrent_size")]
    pub max_torrent_size: u64,
    /// URL template for magnet metadata, `{infohash}` or `{INFOHASH}` is substituted
    pub metadata_source: Option<String>,
    /// SOCKS5 proxy per hop count: entry 0 serves 1 hop, entry 1 serves 2 hops, ...
    #[serde(default)]
    pub socks5_proxies: Vec<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: default_fetch_timeout(),
            max_hops: default_max_hops(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            max_torrent_size: default_max_torrent_size(),
            metadata_source: None,
            socks5_proxies: Vec::new(),
            user_agent: default_user_agent(),
        }
    }
}

// Default value functions
fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_fetch_timeout() -> u64 {
    60
}

fn default_max_hops() -> u32 {
    3
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_torrent_size() -> u64 {
    16 * 1024 * 1024 // 16 MiB
}

fn default_user_agent() -> String {
    format!("torrentinfo/{}", env!("CARGO_PKG_VERSION"))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port.is_none() && self.server.unix_socket.is_none() {
            bail!("Either port or unix_socket must be specified in server config");
        }

        if self.server.port == Some(0) {
            bail!("Server port must be greater than 0");
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if self.resolver.fetch_timeout == 0 {
            bail!("fetch_timeout must be greater than 0");
        }

        if self.resolver.max_hops as usize > self.fetch.socks5_proxies.len()
            && !self.fetch.socks5_proxies.is_empty()
        {
            bail!(
                "max_hops ({}) exceeds the number of configured socks5_proxies ({})",
                self.resolver.max_hops,
                self.fetch.socks5_proxies.len()
            );
        }

        if self.fetch.request_timeout == 0 {
            bail!("request_timeout must be greater than 0");
        }

        if self.fetch.max_torrent_size == 0 {
            bail!("max_torrent_size must be greater than 0");
        }

        if let Some(source) = &self.fetch.metadata_source {
            if !source.contains("{infohash}") && !source.contains("{INFOHASH}") {
                bail!("metadata_source must contain {{infohash}} or {{INFOHASH}}");
            }
        }

        if self.admin.api_key.is_empty() {
            bail!("api_key must not be empty");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            server: ServerConfig {
                port: Some(8080),
                unix_socket: None,
                num_threads: 2,
            },
            resolver: ResolverConfig {
                fetch_timeout: 5,
                max_hops: 3,
            },
            fetch: FetchConfig {
                request_timeout: 5,
                ..FetchConfig::default()
            },
            admin: AdminConfig {
                api_key: "test-api-key".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "console".to_string(),
                console: true,
            },
        }
    }
}
