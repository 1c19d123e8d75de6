use crate::core::error::ValidationError;
use data_encoding::BASE32;
use std::fmt;

/// 20-byte SHA-1 digest of a torrent's bencoded info dictionary
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InfoHash([u8; 20]);

impl InfoHash {
    pub const LEN: usize = 20;

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// SHA-1 of raw bencoded info dictionary bytes
    pub fn from_info_bytes(info: &[u8]) -> Self {
        use sha1::{Digest, Sha1};

        let digest = Sha1::digest(info);
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&digest);
        Self(hash)
    }

    /// Parse a 40-character hex string, case-insensitive
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        let bytes = hex::decode(s).map_err(|e| ValidationError::InvalidInfoHash(e.to_string()))?;

        let hash: [u8; 20] = bytes.try_into().map_err(|b: Vec<u8>| {
            ValidationError::InvalidInfoHash(format!(
                "expected {} bytes, got {}",
                Self::LEN,
                b.len()
            ))
        })?;

        Ok(Self(hash))
    }

    /// Parse a 32-character RFC 4648 base32 string, case-insensitive
    pub fn from_base32(s: &str) -> Result<Self, ValidationError> {
        let bytes = BASE32
            .decode(s.to_ascii_uppercase().as_bytes())
            .map_err(|e| ValidationError::InvalidInfoHash(format!("invalid base32: {}", e)))?;

        let hash: [u8; 20] = bytes.try_into().map_err(|b: Vec<u8>| {
            ValidationError::InvalidInfoHash(format!(
                "expected {} bytes, got {}",
                Self::LEN,
                b.len()
            ))
        })?;

        Ok(Self(hash))
    }

    /// Parse the value of a magnet `xt=urn:btih:` parameter
    pub fn from_btih(s: &str) -> Result<Self, ValidationError> {
        match s.len() {
            40 => Self::from_hex(s),
            32 => Self::from_base32(s),
            n => Err(ValidationError::InvalidInfoHash(format!(
                "btih must be 40 hex or 32 base32 characters, got {}",
                n
            ))),
        }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfoHash({})", self.to_hex())
    }
}
