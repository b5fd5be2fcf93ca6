use chrono::{Duration, NaiveDate};

/// MOCO expects activity dates formatted as `yyyy-MM-dd`.
pub fn booking_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Formats an idle duration like `2h 05m`. Negative durations (clock skew) render as zero.
pub fn format_idle(duration: Duration) -> String {
    let minutes = duration.num_minutes().max(0);
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::{booking_date, format_idle};

    #[test]
    fn test_booking_date_is_iso() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(booking_date(date), "2024-03-07");
    }

    #[test]
    fn test_format_idle() {
        assert_eq!(format_idle(Duration::minutes(125)), "2h 05m");
        assert_eq!(format_idle(Duration::minutes(59)), "0h 59m");
        assert_eq!(format_idle(Duration::minutes(-3)), "0h 00m");
    }
}
