pub mod downloads;
pub mod fallback;
pub mod health;
pub mod metrics;
pub mod torrentinfo;
