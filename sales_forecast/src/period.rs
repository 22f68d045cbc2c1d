//! Calendar months as the time axis of every series

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month, stored as the first day of that month.
///
/// Any date converts into the month containing it:
///
/// ```
/// use chrono::NaiveDate;
/// use sales_forecast::Period;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
/// let period = Period::from_date(date);
/// assert_eq!(period.to_string(), "2024-03-01");
/// assert_eq!(period.next().unwrap().to_string(), "2024-04-01");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period(NaiveDate);

impl Period {
    /// Create a period from a year and a 1-based month
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Period)
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!("Invalid month {}-{:02}", year, month))
            })
    }

    /// The month containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        Period(date - Duration::days(i64::from(date.day0())))
    }

    /// Parse a date-like string.
    ///
    /// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`
    /// and `YYYY-MM`.
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::from_date(date));
        }
        for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Self::from_date(datetime.date()));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d") {
            return Ok(Self::from_date(date));
        }

        Err(ForecastError::DataError(format!(
            "Cannot parse '{}' as a month",
            input
        )))
    }

    /// The month immediately after this one
    pub fn next(&self) -> Result<Self> {
        self.0
            .checked_add_months(Months::new(1))
            .map(Period)
            .ok_or_else(|| ForecastError::DataError(format!("No month follows {}", self)))
    }

    /// First day of the month
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }
}

impl From<NaiveDate> for Period {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

impl FromStr for Period {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Period {
    type Error = ForecastError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2023-07-01", 2023, 7)]
    #[case("2023-07-31", 2023, 7)]
    #[case("2023-07-15 13:45:00", 2023, 7)]
    #[case("2023-07-15T13:45:00", 2023, 7)]
    #[case("2023-07", 2023, 7)]
    #[case(" 2024-02-29 ", 2024, 2)]
    fn test_parse_normalizes_to_first_of_month(
        #[case] input: &str,
        #[case] year: i32,
        #[case] month: u32,
    ) {
        let period = Period::parse(input).unwrap();
        assert_eq!(period, Period::new(year, month).unwrap());
        assert_eq!(period.date().day(), 1);
    }

    #[rstest]
    #[case("")]
    #[case("July 2023")]
    #[case("2023-13-01")]
    fn test_parse_rejects_garbage(#[case] input: &str) {
        assert!(matches!(Period::parse(input), Err(ForecastError::DataError(_))));
    }

    #[test]
    fn test_next_rolls_over_year() {
        let dec = Period::new(2023, 12).unwrap();
        assert_eq!(dec.next().unwrap(), Period::new(2024, 1).unwrap());

        let jan = Period::new(2024, 1).unwrap();
        assert_eq!(jan.next().unwrap().month(), 2);
    }

    #[test]
    fn test_invalid_month() {
        assert!(Period::new(2024, 0).is_err());
        assert!(Period::new(2024, 13).is_err());
    }

    #[test]
    fn test_serde_uses_calendar_date() {
        let period = Period::new(2024, 5).unwrap();
        let json = serde_json::to_string(&period).unwrap();
        assert_eq!(json, "\"2024-05-01\"");

        let back: Period = serde_json::from_str("\"2024-05-20\"").unwrap();
        assert_eq!(back, period);
    }
}
