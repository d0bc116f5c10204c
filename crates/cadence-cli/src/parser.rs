use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_english::{parse_date_string, Dialect};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
#[error("Failed to parse date/time '{input}': expected RFC 3339 (2024-01-08T10:00:00Z), 'YYYY-MM-DD HH:MM' or a phrase like 'tomorrow 9am'")]
pub struct ParseInstantError {
    input: String,
}

const NAIVE_FORMATS: [&str; 4] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parses a user-supplied instant. All naive inputs are read as UTC.
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>, ParseInstantError> {
    parse_instant_relative_to(input, Utc::now())
}

pub fn parse_instant_relative_to(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ParseInstantError> {
    let trimmed = input.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    parse_date_string(trimmed, now, Dialect::Us).map_err(|_| ParseInstantError {
        input: input.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn jan_8_10am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 8, 10, 0, 0).unwrap()
    }

    #[rstest]
    #[case("2024-01-08T10:00:00Z")]
    #[case("2024-01-08T11:00:00+01:00")]
    #[case("2024-01-08T10:00:00.000Z")]
    #[case("2024-01-08 10:00")]
    #[case("2024-01-08 10:00:00")]
    #[case("2024-01-08T10:00")]
    #[case("  2024-01-08T10:00:00Z  ")]
    fn test_explicit_formats(#[case] input: &str) {
        assert_eq!(parse_instant(input), Ok(jan_8_10am()));
    }

    #[test]
    fn test_bare_date_is_midnight_utc() {
        assert_eq!(
            parse_instant("2024-01-08"),
            Ok(Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_natural_language_fallback() {
        let now = jan_8_10am();
        let parsed = parse_instant_relative_to("tomorrow", now).unwrap();
        assert_eq!(parsed.date_naive(), (now + Duration::days(1)).date_naive());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(parse_instant("not a date at all").is_err());
    }
}
