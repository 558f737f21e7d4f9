pub mod assignment;
pub mod attendance;
pub mod location;
pub mod reports;

use chrono::{NaiveDate, NaiveTime};

use crate::error::ApiError;

pub(crate) fn fmt_hhmm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

pub(crate) fn fmt_hhmmss(t: NaiveTime) -> String {
    t.format("%H:%M:%S").to_string()
}

/// Parse an optional `YYYY-MM-DD` query parameter.
pub(crate) fn parse_date_param(
    value: Option<&str>,
    field: &str,
) -> Result<Option<NaiveDate>, ApiError> {
    match value {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::validation(format!("{field} must be a YYYY-MM-DD date"))),
    }
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub(crate) fn parse_time_of_day(value: &str, field: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| ApiError::validation(format!("{field} must be HH:MM or HH:MM:SS")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_time_formats() {
        assert_eq!(
            parse_time_of_day("09:00", "start_time").unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(
            parse_time_of_day("23:59:59", "start_time").unwrap(),
            NaiveTime::from_hms_opt(23, 59, 59).unwrap()
        );
        assert!(parse_time_of_day("9am", "start_time").is_err());
    }

    #[test]
    fn parses_optional_dates() {
        assert_eq!(parse_date_param(None, "from").unwrap(), None);
        assert_eq!(
            parse_date_param(Some("2026-08-26"), "from").unwrap(),
            NaiveDate::from_ymd_opt(2026, 8, 26)
        );
        assert!(parse_date_param(Some("26/08/2026"), "from").is_err());
    }
}
