//! Calendar day keys and date-range enumeration.
//!
//! A [`DayKey`] is the unit of parallel work during ingestion. The remote
//! API addresses each day as `YYYYMMDD`, so that is both the display form
//! and the serialized form.
//!
//! # Example
//!
//! ```rust
//! use subway_types::{DayKey, NaiveDate};
//!
//! let days = DayKey::range(
//!     NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
//! ).unwrap();
//!
//! let keys: Vec<String> = days.iter().map(|d| d.to_string()).collect();
//! assert_eq!(keys, ["20240228", "20240229", "20240301"]);
//! ```

use crate::TypeError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Textual form used by the remote API.
const DAY_KEY_FORMAT: &str = "%Y%m%d";

/// A calendar day, ordered chronologically and rendered as `YYYYMMDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// Wrap a calendar date.
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build a key from year/month/day, `None` if the date does not exist.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The underlying calendar date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Every day from `start` to `end`, both inclusive, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::InvalidRange`] when `end` is before `start`.
    /// No partial output is produced in that case.
    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Vec<DayKey>, TypeError> {
        if end < start {
            return Err(TypeError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        Ok(start
            .iter_days()
            .take_while(|day| *day <= end)
            .map(DayKey)
            .collect())
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_KEY_FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // chrono accepts variable-width fields, so pin the length first
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypeError::InvalidDayKey(s.to_string()));
        }
        NaiveDate::parse_from_str(s, DAY_KEY_FORMAT)
            .map(DayKey)
            .map_err(|_| TypeError::InvalidDayKey(s.to_string()))
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl TryFrom<String> for DayKey {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DayKey> for String {
    fn from(day: DayKey) -> Self {
        day.to_string()
    }
}
