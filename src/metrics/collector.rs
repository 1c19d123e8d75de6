use crate::core::error::ResolveError;
use crate::stores::download_store::DownloadStore;
use crate::utils::time::{current_timestamp, elapsed_seconds};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct Metrics {
    pub total_requests: AtomicU64,
    pub resolved: AtomicU64,
    pub validation_failures: AtomicU64,
    pub fetch_failures: AtomicU64,
    pub parse_failures: AtomicU64,
    pub existing_downloads_hit: AtomicU64,
    pub start_time: i64,
}

#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub resolved: u64,
    pub validation_failures: u64,
    pub fetch_failures: u64,
    pub parse_failures: u64,
    pub existing_downloads_hit: u64,
    pub success_rate: f64,
    pub downloads: usize,
    pub pending_metainfo_requests: usize,
    pub uptime_seconds: i64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            resolved: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            parse_failures: AtomicU64::new(0),
            existing_downloads_hit: AtomicU64::new(0),
            start_time: current_timestamp(),
        }
    }

    pub fn increment_requests(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resolved(&self, download_exists: bool) {
        self.resolved.fetch_add(1, Ordering::Relaxed);
        if download_exists {
            self.existing_downloads_hit.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count a failure under its category
    pub fn record_failure(&self, error: &ResolveError) {
        let counter = match error {
            ResolveError::Validation(_) => &self.validation_failures,
            ResolveError::Fetch(_) => &self.fetch_failures,
            ResolveError::Parse(_) => &self.parse_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self, downloads: &DownloadStore) -> MetricsSnapshot {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let resolved = self.resolved.load(Ordering::Relaxed);

        let success_rate = if total_requests > 0 {
            (resolved as f64 / total_requests as f64) * 100.0
        } else {
            0.0
        };

        MetricsSnapshot {
            total_requests,
            resolved,
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            existing_downloads_hit: self.existing_downloads_hit.load(Ordering::Relaxed),
            success_rate,
            downloads: downloads.download_count(),
            pending_metainfo_requests: downloads.metainfo_request_count(),
            uptime_seconds: elapsed_seconds(self.start_time, current_timestamp()),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
