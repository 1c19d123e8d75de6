use crate::core::error::AdminError;
use tracing::warn;

/// Compare two secrets without short-circuiting on the first differing byte
pub fn constant_time_eq(provided: &[u8], expected: &[u8]) -> bool {
    provided.len() == expected.len()
        && provided
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Reject an admin request whose API key does not match the configured one
///
/// `action` only labels the warning logged on failure.
pub fn require_api_key(provided: &str, expected: &str, action: &str) -> Result<(), AdminError> {
    if constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        warn!(action, "Unauthorized admin request");
        Err(AdminError::InvalidApiKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"test-key", b"test-key"));
        assert!(!constant_time_eq(b"wrong-key", b"test-key"));
        assert!(!constant_time_eq(b"short", b"much-longer-key"));
        assert!(!constant_time_eq(b"Test-Key", b"test-key"));
    }

    #[test]
    fn test_require_api_key() {
        assert!(require_api_key("secret", "secret", "test").is_ok());
        assert!(matches!(
            require_api_key("guess", "secret", "test"),
            Err(AdminError::InvalidApiKey)
        ));
    }
}
