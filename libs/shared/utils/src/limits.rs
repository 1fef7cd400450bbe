pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 200;

/// Page size from a raw `limit` query value. Missing, non-numeric or
/// non-positive values fall back to the default; the result never
/// exceeds the cap.
pub fn page_limit(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value >= 1.0)
        .map(|value| (value as usize).min(MAX_PAGE_LIMIT))
        .unwrap_or(DEFAULT_PAGE_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_limit() {
        assert_eq!(page_limit(None), 50);
        assert_eq!(page_limit(Some("20")), 20);
        assert_eq!(page_limit(Some("5000")), 200);
        assert_eq!(page_limit(Some("abc")), 50);
        assert_eq!(page_limit(Some("0")), 50);
        assert_eq!(page_limit(Some("-3")), 50);
    }
}
