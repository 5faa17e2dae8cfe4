//! Calendar-date helpers shared by range resolution and output.

use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

use crate::ValidationError;

/// Parses an ISO `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<Date, ValidationError> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(input.trim(), &format).map_err(|_| ValidationError::InvalidDate {
        value: input.to_owned(),
    })
}

/// Formats a date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    let format = format_description!("[year]-[month]-[day]");
    date.format(&format)
        .unwrap_or_else(|_| format!("{}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day()))
}

/// Today's date in UTC.
pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// `date` shifted by a signed number of days.
pub fn shift_days(date: Date, days: i64) -> Result<Date, ValidationError> {
    date.checked_add(Duration::days(days))
        .ok_or(ValidationError::DateOutOfRange)
}

/// Serde adapter emitting dates as `YYYY-MM-DD` strings.
pub mod iso_date {
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        super::parse_date(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn round_trips_iso_dates() {
        let parsed = parse_date("2024-02-29").expect("leap day parses");
        assert_eq!(parsed, date!(2024 - 02 - 29));
        assert_eq!(format_date(parsed), "2024-02-29");
    }

    #[test]
    fn rejects_non_iso_dates() {
        let err = parse_date("29/02/2024").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidDate { .. }));
    }

    #[test]
    fn shifts_across_month_boundary() {
        let shifted = shift_days(date!(2024 - 03 - 01), -1).expect("in range");
        assert_eq!(shifted, date!(2024 - 02 - 29));
    }
}
