use chrono::Utc;

/// Get current Unix timestamp in seconds
pub fn get_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Today's date as `YYYY-MM-DD` (UTC), the format stored on blog posts.
pub fn today_string() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_is_iso_date() {
        let d = today_string();
        assert_eq!(d.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(&d, "%Y-%m-%d").is_ok());
    }

    #[test]
    fn timestamp_is_recent() {
        assert!(get_timestamp() > 1_700_000_000);
    }
}
