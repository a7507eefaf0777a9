//! Hydrological year labels.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::fmt::{Display, Formatter};

/// Month that opens the hydrological year when nothing else is configured (October).
pub const DEFAULT_FIRST_MONTH: u32 = 10;

/// Label of a hydrological year.
///
/// A hydrological year starting in October 2009 runs until the end of
/// September 2010 and is labelled `HydroYear(2010)`: the label is the calendar
/// year in which the accounting period *ends*.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct HydroYear(pub i32);

impl HydroYear {
    /// Labels `date` for a hydrological year that starts on the first day of `first_month`.
    ///
    /// Returns `None` if `first_month` is not a month number (1..=12).
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use estreams::HydroYear;
    ///
    /// let autumn = NaiveDate::from_ymd_opt(2009, 10, 1).unwrap();
    /// let summer = NaiveDate::from_ymd_opt(2010, 9, 30).unwrap();
    /// assert_eq!(HydroYear::from_date(autumn, 10), Some(HydroYear(2010)));
    /// assert_eq!(HydroYear::from_date(summer, 10), Some(HydroYear(2010)));
    /// ```
    pub fn from_date(date: NaiveDate, first_month: u32) -> Option<Self> {
        if !(1..=12).contains(&first_month) {
            return None;
        }
        if date.month() >= first_month {
            Some(HydroYear(date.year() + 1))
        } else {
            Some(HydroYear(date.year()))
        }
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl Display for HydroYear {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// Labels every date of a series. `None` when `first_month` is out of range.
pub fn hydro_years(dates: &[NaiveDate], first_month: u32) -> Option<Vec<HydroYear>> {
    dates
        .iter()
        .map(|date| HydroYear::from_date(*date, first_month))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_october_start() {
        assert_eq!(HydroYear::from_date(date(2000, 9, 30), 10), Some(HydroYear(2000)));
        assert_eq!(HydroYear::from_date(date(2000, 10, 1), 10), Some(HydroYear(2001)));
        assert_eq!(HydroYear::from_date(date(2000, 12, 31), 10), Some(HydroYear(2001)));
    }

    #[test]
    fn test_january_start_is_calendar_year_plus_one() {
        // Every month is >= 1, so the label shifts for the whole year.
        assert_eq!(HydroYear::from_date(date(2000, 1, 1), 1), Some(HydroYear(2001)));
        assert_eq!(HydroYear::from_date(date(2000, 12, 31), 1), Some(HydroYear(2001)));
    }

    #[test]
    fn test_invalid_first_month() {
        assert_eq!(HydroYear::from_date(date(2000, 5, 1), 0), None);
        assert_eq!(HydroYear::from_date(date(2000, 5, 1), 13), None);
        assert!(hydro_years(&[date(2000, 5, 1)], 13).is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(HydroYear(987).to_string(), "0987");
        assert_eq!(HydroYear(2010).to_string(), "2010");
    }
}
