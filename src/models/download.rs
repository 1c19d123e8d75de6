use crate::models::infohash::InfoHash;

/// A user-initiated transfer known to the download store
#[derive(Clone, Debug)]
pub struct Download {
    pub info_hash: InfoHash,
    pub name: String,
    /// Unix timestamp (seconds) when the download was registered
    pub added_at: i64,
}

impl Download {
    pub fn new(info_hash: InfoHash, name: String, added_at: i64) -> Self {
        Self {
            info_hash,
            name,
            added_at,
        }
    }
}

/// A transient metadata-only fetch, shared by every request waiting on the same info hash
#[derive(Clone, Debug, Default)]
pub struct MetainfoRequest {
    pub pending: usize,
}
