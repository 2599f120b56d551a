//! Calendar quarters.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Quarter number outside 1..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid quarter: {0} (must be 1-4)")]
pub struct InvalidQuarter(pub u8);

/// A calendar quarter, 1 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quarter(u8);

impl Quarter {
    pub fn new(quarter: u8) -> Result<Self, InvalidQuarter> {
        if (1..=4).contains(&quarter) {
            Ok(Self(quarter))
        } else {
            Err(InvalidQuarter(quarter))
        }
    }

    /// The quarter containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self((date.month0() / 3) as u8 + 1)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// First and last day of this quarter in `year`, inclusive.
    ///
    /// `None` only for years chrono cannot represent.
    pub fn date_range(self, year: i32) -> Option<(NaiveDate, NaiveDate)> {
        let first_month = (u32::from(self.0) - 1) * 3 + 1;
        let start = NaiveDate::from_ymd_opt(year, first_month, 1)?;
        let end = if self.0 == 4 {
            NaiveDate::from_ymd_opt(year, 12, 31)?
        } else {
            NaiveDate::from_ymd_opt(year, first_month + 3, 1)?.pred_opt()?
        };
        Some((start, end))
    }

    /// Whether `date` falls in this quarter of `year`.
    pub fn contains(self, date: NaiveDate, year: i32) -> bool {
        date.year() == year && Self::of(date) == self
    }
}

impl TryFrom<u8> for Quarter {
    type Error = InvalidQuarter;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quarter> for u8 {
    fn from(quarter: Quarter) -> Self {
        quarter.0
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0)
    }
}
