use chrono::{DateTime, Local, NaiveDate, TimeZone};

/// Format days are stored and exchanged in.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// The current day in the server's local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Truncate a timestamp to its calendar day, in the timestamp's own zone.
pub fn day_of<Tz: TimeZone>(ts: &DateTime<Tz>) -> NaiveDate {
    ts.date_naive()
}

pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Parse a stored day. Accepts a bare `YYYY-MM-DD` or anything that starts
/// with one (SQLite `datetime` output, RFC 3339), dropping the time part.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let prefix = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, DAY_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn parse_day_drops_time_component() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(parse_day("2024-03-10"), Some(expected));
        assert_eq!(parse_day("2024-03-10 23:59:59"), Some(expected));
        assert_eq!(parse_day("2024-03-10T00:00:00+05:00"), Some(expected));
    }

    #[test]
    fn parse_day_rejects_garbage() {
        assert_eq!(parse_day(""), None);
        assert_eq!(parse_day("yesterday"), None);
        assert_eq!(parse_day("2024-13-01"), None);
    }

    #[test]
    fn day_of_uses_the_timestamps_zone() {
        let utc = Utc.with_ymd_and_hms(2024, 3, 9, 22, 30, 0).unwrap();
        let plus_three = utc.with_timezone(&FixedOffset::east_opt(3 * 3600).unwrap());

        assert_eq!(day_of(&utc), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(day_of(&plus_three), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn format_round_trips_through_parse() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(format_day(day), "2024-02-29");
        assert_eq!(parse_day(&format_day(day)), Some(day));
    }
}
