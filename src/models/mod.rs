pub mod api;
pub mod download;
pub mod infohash;
pub mod metainfo;
pub mod reference;
