// Centralized error handling for the torrent info service

use crate::bencode::decoder::DecodeError;
use crate::models::api::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

/// Malformed request input. Always the client's fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid uri: {0}")]
    InvalidUri(String),

    #[error("Invalid hops: {0}")]
    InvalidHops(String),

    #[error("Magnet link has no btih info hash")]
    MissingInfoHash,

    #[error("Invalid info hash: {0}")]
    InvalidInfoHash(String),
}

/// The fetch mechanism could not obtain data
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Fetch timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Failed to read torrent file: {0}")]
    Io(String),

    #[error("Source unreachable: {0}")]
    Unreachable(String),

    #[error("Source returned HTTP status {0}")]
    HttpStatus(u16),

    #[error("Torrent exceeds size limit of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("No metadata source available for magnet link")]
    NoMetadataSource,

    #[error("No anonymity route configured for {hops} hops")]
    NoAnonymityRoute { hops: u32 },

    #[error("Failed to fetch metainfo for {0}")]
    NoMetainfo(String),

    #[error("Received invalid metainfo: {0}")]
    InvalidMetainfo(String),

    #[error("Metainfo info hash {actual} does not match requested {expected}")]
    InfoHashMismatch { expected: String, actual: String },

    #[error("Invalid redirect target: {0}")]
    InvalidRedirect(String),
}

/// Bytes were obtained but are not a valid torrent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid bencode: {0}")]
    Bencode(#[from] DecodeError),

    #[error("Torrent root is not a dictionary")]
    NotADictionary,

    #[error("Missing '{0}' field")]
    MissingField(&'static str),

    #[error("Invalid '{field}' field: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Any failure of a torrent resolution
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl ResolveError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ResolveError::Validation(_) => StatusCode::BAD_REQUEST,
            ResolveError::Fetch(_) | ResolveError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Resource not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = match &self {
            AdminError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AdminError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            AdminError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Error, Debug)]
pub enum MonitoringError {
    #[error("Invalid API key")]
    InvalidApiKey,
}

impl IntoResponse for MonitoringError {
    fn into_response(self) -> Response {
        match self {
            MonitoringError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
        }
    }
}
