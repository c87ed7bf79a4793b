use chrono::{DateTime, Utc};

/// Renders an RFC 3339 timestamp such as a repository's `updated_at`.
/// Anything that does not parse is returned as given.
pub fn format_timestamp(iso: &str) -> String {
    match DateTime::parse_from_rfc3339(iso) {
        Ok(at) => at.with_timezone(&Utc).format("%b %-d, %Y, %H:%M").to_string(),
        Err(_) => iso.to_string(),
    }
}

/// Renders a rate-limit reset time given in epoch seconds.
pub fn format_reset(epoch_seconds: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(epoch_seconds, 0)
        .map(|at| at.format("%H:%M:%S UTC").to_string())
}

/// Seconds from now until `epoch_seconds`, zero if already past.
pub fn seconds_until(epoch_seconds: i64) -> u64 {
    let now = Utc::now().timestamp();
    u64::try_from(epoch_seconds.saturating_sub(now)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_valid_timestamp() {
        assert_eq!(format_timestamp("2024-01-02T03:04:05Z"), "Jan 2, 2024, 03:04");
    }

    #[test]
    fn returns_input_when_invalid() {
        assert_eq!(format_timestamp("not-a-date"), "not-a-date");
    }

    #[test]
    fn reset_time_is_rendered_in_utc() {
        assert_eq!(format_reset(0).as_deref(), Some("00:00:00 UTC"));
        assert_eq!(format_reset(3_661).as_deref(), Some("01:01:01 UTC"));
    }

    #[test]
    fn seconds_until_past_is_zero() {
        assert_eq!(seconds_until(0), 0);
        assert!(seconds_until(Utc::now().timestamp() + 120) > 100);
    }

    #[test]
    fn seconds_until_extreme_resets() {
        assert_eq!(seconds_until(i64::MIN), 0);
        assert!(seconds_until(i64::MAX) > 0);
    }
}
