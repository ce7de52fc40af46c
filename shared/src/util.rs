use chrono::{Datelike, TimeZone, Utc};

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Calendar year (UTC) of a millisecond timestamp.
///
/// Falls back to the current year for timestamps chrono cannot represent.
pub fn year_of_millis(millis: i64) -> i32 {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(Utc::now)
        .year()
}

/// Hours → milliseconds
pub const fn hours_to_millis(hours: i64) -> i64 {
    hours * 60 * 60 * 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_of_millis() {
        // 2025-01-01T00:00:00Z
        assert_eq!(year_of_millis(1_735_689_600_000), 2025);
        // 2024-12-31T23:59:59.999Z
        assert_eq!(year_of_millis(1_735_689_599_999), 2024);
    }

    #[test]
    fn test_hours_to_millis() {
        assert_eq!(hours_to_millis(24), 86_400_000);
    }
}
