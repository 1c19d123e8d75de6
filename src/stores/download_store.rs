use crate::models::download::{Download, MetainfoRequest};
use crate::models::infohash::InfoHash;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Read access to known downloads, as needed by the resolver
pub trait DownloadRegistry: Send + Sync {
    /// Whether a full (user-initiated) download exists for this info hash
    fn has_download(&self, info_hash: &InfoHash) -> bool;

    /// Number of requests currently waiting on a metadata-only fetch
    fn pending_metainfo_requests(&self, info_hash: &InfoHash) -> usize;
}

/// In-memory registry of full downloads and in-flight metadata-only fetches
///
/// The two categories are independent maps: an info hash may sit in both at
/// once while a metadata fetch races a user adding the same torrent.
pub struct DownloadStore {
    downloads: DashMap<InfoHash, Arc<Download>>,
    metainfo_requests: DashMap<InfoHash, MetainfoRequest>,
}

impl DownloadStore {
    pub fn new() -> Self {
        Self {
            downloads: DashMap::new(),
            metainfo_requests: DashMap::new(),
        }
    }

    /// Add a download, replacing any existing entry for the same info hash
    pub fn add_download(&self, download: Download) {
        let info_hash = download.info_hash;
        self.downloads.insert(info_hash, Arc::new(download));
    }

    pub fn remove_download(&self, info_hash: &InfoHash) -> Option<Arc<Download>> {
        self.downloads.remove(info_hash).map(|(_, download)| download)
    }

    pub fn get_download(&self, info_hash: &InfoHash) -> Option<Arc<Download>> {
        self.downloads.get(info_hash).map(|entry| Arc::clone(entry.value()))
    }

    /// All downloads, ordered by info hash
    pub fn list_downloads(&self) -> Vec<Arc<Download>> {
        let mut downloads: Vec<_> = self
            .downloads
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        downloads.sort_by_key(|d| d.info_hash);
        downloads
    }

    pub fn download_count(&self) -> usize {
        self.downloads.len()
    }

    /// Register a waiter on a metadata-only fetch
    ///
    /// The returned guard releases the waiter when dropped, including when the
    /// owning future is cancelled mid-fetch.
    pub fn begin_metainfo_request(&self, info_hash: InfoHash) -> MetainfoRequestGuard<'_> {
        let pending = {
            let mut entry = self.metainfo_requests.entry(info_hash).or_default();
            entry.pending += 1;
            entry.pending
        };

        debug!(info_hash = %info_hash, pending, "Metainfo request registered");

        MetainfoRequestGuard {
            store: self,
            info_hash,
        }
    }

    /// Number of info hashes with at least one pending metadata fetch
    pub fn metainfo_request_count(&self) -> usize {
        self.metainfo_requests.len()
    }

    fn release_metainfo_request(&self, info_hash: &InfoHash) {
        if let Entry::Occupied(mut entry) = self.metainfo_requests.entry(*info_hash) {
            let request = entry.get_mut();
            request.pending = request.pending.saturating_sub(1);
            if request.pending == 0 {
                entry.remove();
            }
        }

        debug!(info_hash = %info_hash, "Metainfo request released");
    }
}

impl DownloadRegistry for DownloadStore {
    fn has_download(&self, info_hash: &InfoHash) -> bool {
        self.downloads.contains_key(info_hash)
    }

    fn pending_metainfo_requests(&self, info_hash: &InfoHash) -> usize {
        self.metainfo_requests
            .get(info_hash)
            .map(|entry| entry.pending)
            .unwrap_or(0)
    }
}

impl Default for DownloadStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps a metadata-only request registered for as long as it lives
pub struct MetainfoRequestGuard<'a> {
    store: &'a DownloadStore,
    info_hash: InfoHash,
}

impl Drop for MetainfoRequestGuard<'_> {
    fn drop(&mut self) {
        self.store.release_metainfo_request(&self.info_hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(byte: u8) -> InfoHash {
        InfoHash::new([byte; 20])
    }

    #[test]
    fn test_add_and_remove_download() {
        let store = DownloadStore::new();
        store.add_download(Download::new(hash(1), "ubuntu".to_string(), 1));

        assert!(store.has_download(&hash(1)));
        assert_eq!(store.get_download(&hash(1)).unwrap().name, "ubuntu");
        assert_eq!(store.download_count(), 1);

        assert!(store.remove_download(&hash(1)).is_some());
        assert!(!store.has_download(&hash(1)));
        assert!(store.remove_download(&hash(1)).is_none());
    }

    #[test]
    fn test_add_download_replaces_existing() {
        let store = DownloadStore::new();
        store.add_download(Download::new(hash(1), "old".to_string(), 1));
        store.add_download(Download::new(hash(1), "new".to_string(), 2));

        assert_eq!(store.download_count(), 1);
        assert_eq!(store.get_download(&hash(1)).unwrap().name, "new");
    }

    #[test]
    fn test_list_downloads_sorted() {
        let store = DownloadStore::new();
        store.add_download(Download::new(hash(3), "c".to_string(), 0));
        store.add_download(Download::new(hash(1), "a".to_string(), 0));
        store.add_download(Download::new(hash(2), "b".to_string(), 0));

        let names: Vec<_> = store.list_downloads().iter().map(|d| d.name.clone()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_metainfo_request_is_not_a_download() {
        let store = DownloadStore::new();
        let _guard = store.begin_metainfo_request(hash(7));

        assert_eq!(store.pending_metainfo_requests(&hash(7)), 1);
        assert!(!store.has_download(&hash(7)));
    }

    #[test]
    fn test_metainfo_guard_counts_waiters() {
        let store = DownloadStore::new();

        let first = store.begin_metainfo_request(hash(7));
        let second = store.begin_metainfo_request(hash(7));
        assert_eq!(store.pending_metainfo_requests(&hash(7)), 2);
        assert_eq!(store.metainfo_request_count(), 1);

        drop(first);
        assert_eq!(store.pending_metainfo_requests(&hash(7)), 1);

        drop(second);
        assert_eq!(store.pending_metainfo_requests(&hash(7)), 0);
        assert_eq!(store.metainfo_request_count(), 0);
    }

    #[test]
    fn test_both_categories_are_independent() {
        let store = DownloadStore::new();
        store.add_download(Download::new(hash(9), "both".to_string(), 0));
        let _guard = store.begin_metainfo_request(hash(9));

        assert!(store.has_download(&hash(9)));
        assert_eq!(store.pending_metainfo_requests(&hash(9)), 1);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_releases_guard() {
        let store = DownloadStore::new();

        let fetch = async {
            let _guard = store.begin_metainfo_request(hash(5));
            std::future::pending::<()>().await;
        };

        let result = tokio::time::timeout(std::time::Duration::from_millis(20), fetch).await;

        assert!(result.is_err());
        assert_eq!(store.pending_metainfo_requests(&hash(5)), 0);
        assert_eq!(store.metainfo_request_count(), 0);
    }
}
