pub mod download_store;
