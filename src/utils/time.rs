use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch, or 0 when the clock is set before it
pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

pub fn elapsed_seconds(start: i64, end: i64) -> i64 {
    (end - start).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_timestamp() {
        let ts = current_timestamp();
        // After 2020-01-01, before 2100-01-01
        assert!(ts > 1577836800);
        assert!(ts < 4102444800);
    }

    #[test]
    fn test_elapsed_seconds() {
        assert_eq!(elapsed_seconds(100, 160), 60);
        assert_eq!(elapsed_seconds(160, 100), 0);
    }
}
