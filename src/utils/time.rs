//! Timestamp encoding shared by every table.
//!
//! Timestamps are stored as fixed-width UTC strings so that SQL range
//! comparisons and `ORDER BY` on the text column follow chronological order.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::DomainError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::Internal(format!("corrupt timestamp '{}': {}", raw, e)))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn today() -> String {
    format_date(Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn timestamps_are_fixed_width_and_sortable() {
        let a = Utc.with_ymd_and_hms(2024, 1, 9, 23, 59, 59).unwrap();
        let b = a + Duration::milliseconds(1);
        let (fa, fb) = (format_timestamp(a), format_timestamp(b));

        assert_eq!(fa.len(), fb.len());
        assert_eq!(fa, "2024-01-09T23:59:59.000000Z");
        assert!(fa < fb);
    }

    #[test]
    fn parse_round_trips_formatted_value() {
        let at = Utc.with_ymd_and_hms(2023, 6, 1, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(at)).unwrap(), at);
    }
}
