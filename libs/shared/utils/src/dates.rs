use chrono::{DateTime, NaiveDate, Utc};

pub const MAX_GESTATIONAL_WEEK: i64 = 40;

/// Parses a calendar day from `yyyy-mm-dd` or an RFC 3339 instant
/// (converted to UTC, time of day dropped).
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|instant| instant.with_timezone(&Utc).date_naive())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Week of pregnancy on `today` for a pregnancy that started on `start`,
/// clamped to 1..=40.
pub fn gestational_week(start: NaiveDate, today: NaiveDate) -> i32 {
    let elapsed_days = (today - start).num_days().max(0);
    (elapsed_days / 7 + 1).clamp(1, MAX_GESTATIONAL_WEEK) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_normalize_plain_date() {
        assert_eq!(normalize_date(" 2025-03-10 "), Some(day("2025-03-10")));
    }

    #[test]
    fn test_normalize_instant_uses_utc_day() {
        assert_eq!(normalize_date("2025-03-10T01:30:00+05:30"), Some(day("2025-03-09")));
        assert_eq!(normalize_date("2025-03-10T23:59:59Z"), Some(day("2025-03-10")));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("next tuesday"), None);
        assert_eq!(normalize_date("2025-13-40"), None);
    }

    #[test]
    fn test_gestational_week_bounds() {
        let start = day("2025-01-01");
        assert_eq!(gestational_week(start, day("2025-01-01")), 1);
        assert_eq!(gestational_week(start, day("2025-01-07")), 1);
        assert_eq!(gestational_week(start, day("2025-01-08")), 2);
        // start in the future never drops below week 1
        assert_eq!(gestational_week(start, day("2024-12-01")), 1);
        assert_eq!(gestational_week(start, day("2026-06-01")), 40);
    }
}
