//! Date cell parsing and the certificate date-range phrase.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::error::FormatError;
use crate::types::CellValue;

/// Text layouts accepted in text cells, tried in order.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Largest serial Excel can represent (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

fn excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Convert an Excel serial day number (1900 date system) to a date-time.
///
/// Fractional parts are the time of day, rounded to the second.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL + 1.0).contains(&serial) {
        return None;
    }
    let days = serial.trunc() as i64;
    let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;
    Some(excel_epoch() + Duration::days(days) + Duration::seconds(seconds))
}

/// Inverse of [`excel_serial_to_datetime`], used when exporting.
pub fn datetime_to_excel_serial(dt: &NaiveDateTime) -> f64 {
    let delta = *dt - excel_epoch();
    let days = delta.num_days() as f64;
    let secs = f64::from(dt.num_seconds_from_midnight());
    days + secs / 86_400.0
}

/// Parse a text cell using the accepted layouts.
pub fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Interpret `value` (from `column`) as a calendar date.
pub fn parse_date(column: &str, value: &CellValue) -> Result<NaiveDate, FormatError> {
    let parsed = match value {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::Number(serial) => excel_serial_to_datetime(*serial),
        CellValue::Text(text) => parse_date_text(text),
        CellValue::Empty | CellValue::Bool(_) => None,
    };
    parsed
        .map(|dt| dt.date())
        .ok_or_else(|| FormatError::UnparseableDate {
            column: column.to_string(),
            value: value.to_string(),
        })
}

/// The phrase used on certificates and in emails.
///
/// Same calendar year: `from January 10 to March 20 2024`.
/// Different years: `from December 01 2023 to February 15 2024`.
pub fn format_date_range(start: NaiveDate, end: NaiveDate) -> String {
    if start.year() == end.year() {
        format!(
            "from {} to {} {}",
            start.format("%B %d"),
            end.format("%B %d"),
            end.year()
        )
    } else {
        format!("from {} to {}", start.format("%B %d %Y"), end.format("%B %d %Y"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn same_year_range_mentions_year_once() {
        let text = format_date_range(ymd(2024, 1, 10), ymd(2024, 3, 20));
        assert_eq!(text, "from January 10 to March 20 2024");
        assert_eq!(text.matches("2024").count(), 1);
    }

    #[test]
    fn cross_year_range_mentions_both_years() {
        let text = format_date_range(ymd(2023, 12, 1), ymd(2024, 2, 15));
        assert_eq!(text, "from December 01 2023 to February 15 2024");
    }

    #[rstest]
    #[case("2024-01-10 00:00:00", ymd(2024, 1, 10))]
    #[case("2024-01-10", ymd(2024, 1, 10))]
    #[case("2024-01-10T08:30:00", ymd(2024, 1, 10))]
    #[case("10/01/2024", ymd(2024, 1, 10))]
    fn text_dates_parse(#[case] text: &str, #[case] expected: NaiveDate) {
        let value = CellValue::Text(text.to_string());
        assert_eq!(parse_date("Start Date", &value), Ok(expected));
    }

    #[test]
    fn excel_serial_parses() {
        // 45301 is 2024-01-10 in the 1900 date system.
        assert_eq!(parse_date("Start Date", &CellValue::Number(45301.0)), Ok(ymd(2024, 1, 10)));
    }

    #[test]
    fn serial_roundtrips_with_time() {
        let dt = ymd(2024, 3, 20).and_hms_opt(12, 0, 0).unwrap();
        let serial = datetime_to_excel_serial(&dt);
        assert!((serial - 45371.5).abs() < 1e-9);
        assert_eq!(excel_serial_to_datetime(serial), Some(dt));
    }

    #[rstest]
    #[case(CellValue::Text("soon".into()))]
    #[case(CellValue::Bool(true))]
    #[case(CellValue::Number(-4.0))]
    #[case(CellValue::Number(f64::NAN))]
    fn non_dates_fail_with_format_error(#[case] value: CellValue) {
        let err = parse_date("End Date", &value).unwrap_err();
        let FormatError::UnparseableDate { column, .. } = err;
        assert_eq!(column, "End Date");
    }
}
