//! Calendar date keys for the date-partitioned store.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// A (year, month, day) triple used as the partition key for data files.
///
/// Validation is bounds-only: `1..=12` for month and `1..=31` for day. No
/// real-calendar check is performed, so a date like April 31 is accepted
/// here and resolves to a path like any other; it simply never has data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct CalendarDate {
    year: u16,
    month: u8,
    day: u8,
}

impl CalendarDate {
    /// Creates a new date after bounds-checking the month and day.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDate`] when the month is outside `1..=12`
    /// or the day is outside `1..=31`.
    pub fn new(year: u16, month: u8, day: u8) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidDate {
                message: format!("month must be between 1 and 12, got {month}"),
            });
        }
        if !(1..=31).contains(&day) {
            return Err(Error::InvalidDate {
                message: format!("day must be between 1 and 31, got {day}"),
            });
        }
        Ok(Self { year, month, day })
    }

    /// Parses a date from three decimal strings (as they appear in request
    /// paths and directory names).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDate`] when a component is not a decimal
    /// number or is out of bounds.
    pub fn from_segments(year: &str, month: &str, day: &str) -> Result<Self> {
        let year = parse_component(year, "year")?;
        let month = parse_component(month, "month")?;
        let day = parse_component(day, "day")?;
        Self::new(year, month, day)
    }

    /// The year component.
    #[must_use]
    pub fn year(&self) -> u16 {
        self.year
    }

    /// The month component (1-based).
    #[must_use]
    pub fn month(&self) -> u8 {
        self.month
    }

    /// The day component (1-based).
    #[must_use]
    pub fn day(&self) -> u8 {
        self.day
    }
}

fn parse_component<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| Error::InvalidDate {
        message: format!("{name} must be a decimal number, got {raw:?}"),
    })
}

impl fmt::Display for CalendarDate {
    /// Formats as `YYYY/MM/DD`, zero-padded to 4/2/2 digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

impl From<CalendarDate> for String {
    fn from(date: CalendarDate) -> Self {
        date.to_string()
    }
}
