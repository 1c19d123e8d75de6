pub mod bencode;
pub mod core;
pub mod fetcher;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod resolver;
pub mod stores;
pub mod utils;
pub mod validation;
