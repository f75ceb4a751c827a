use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Integer key of a calendar day, encoded as `YYYYMMDD`.
///
/// Computed from the date itself rather than looked up, so facts can reference days that are
/// outside the generated calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct DateKey(i32);

impl DateKey {
    /// Encodes `date` as `YYYYMMDD`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32)
    }

    /// Encodes the calendar day of `datetime`, dropping the time of day.
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Self::from_date(datetime.date())
    }

    pub fn into_inner(self) -> i32 {
        self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
