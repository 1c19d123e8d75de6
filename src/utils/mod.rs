pub mod auth;
pub mod time;
