use chrono::{Datelike, NaiveDate, Weekday};

/// Date format of CSV files and chart axes
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a YYYY-MM-DD date string
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str, DATE_FORMAT)
}

/// Format a date as YYYY-MM-DD
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Short axis label, e.g. "Mar 04"
pub fn format_axis_date(date: NaiveDate) -> String {
    date.format("%b %d").to_string()
}

/// Check if it's weekend (Saturday or Sunday)
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekdays in `[start, end]`, an upper bound on the rows a daily download can return
pub fn trading_days_between(start: NaiveDate, end: NaiveDate) -> usize {
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .filter(|date| !is_weekend(*date))
        .count()
}

/// Format duration for logging
pub fn format_duration(duration_ms: f64) -> String {
    if duration_ms < 1000.0 {
        format!("{:.1}ms", duration_ms)
    } else if duration_ms < 60000.0 {
        format!("{:.1}s", duration_ms / 1000.0)
    } else {
        let minutes = (duration_ms / 60000.0).floor();
        let seconds = (duration_ms % 60000.0) / 1000.0;
        format!("{}m{:.1}s", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_and_format() {
        let d = parse_date("2024-03-04").unwrap();
        assert_eq!(d, date(2024, 3, 4));
        assert_eq!(format_date(d), "2024-03-04");
        assert_eq!(format_axis_date(d), "Mar 04");
        assert!(parse_date("04/03/2024").is_err());
    }

    #[test]
    fn test_trading_days_between() {
        // Mon 2024-03-04 .. Sun 2024-03-17
        assert_eq!(trading_days_between(date(2024, 3, 4), date(2024, 3, 17)), 10);
        assert_eq!(trading_days_between(date(2024, 3, 9), date(2024, 3, 10)), 0);
        assert_eq!(trading_days_between(date(2024, 3, 5), date(2024, 3, 4)), 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(12.34), "12.3ms");
        assert_eq!(format_duration(2500.0), "2.5s");
        assert_eq!(format_duration(90000.0), "1m30.0s");
    }
}
