//! Measurement counts, valid runs and valid date bounds per series.

use crate::types::daily_series::DailySeries;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::collections::BTreeMap;

/// Valid days a calendar month needs to count as complete.
pub const COMPLETE_MONTH_DAYS: usize = 28;
/// Valid days a calendar year needs to count as complete.
pub const COMPLETE_YEAR_DAYS: usize = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeasurementCounts {
    /// Days with a value.
    pub num_daily_obs: usize,
    /// Calendar months with at least one value.
    pub num_monthly: usize,
    /// Calendar months with at least 28 values.
    pub num_monthly_complete: usize,
    /// Calendar years with at least one value.
    pub num_yearly: usize,
    /// Calendar years with at least 365 values.
    pub num_yearly_complete: usize,
}

impl MeasurementCounts {
    pub fn of(series: &DailySeries) -> Self {
        let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
        let mut years: BTreeMap<i32, usize> = BTreeMap::new();
        let mut num_daily_obs = 0;
        for (date, value) in series.iter() {
            if value.is_none() {
                continue;
            }
            num_daily_obs += 1;
            *months.entry((date.year(), date.month())).or_default() += 1;
            *years.entry(date.year()).or_default() += 1;
        }

        Self {
            num_daily_obs,
            num_monthly: months.len(),
            num_monthly_complete: months.values().filter(|n| **n >= COMPLETE_MONTH_DAYS).count(),
            num_yearly: years.len(),
            num_yearly_complete: years.values().filter(|n| **n >= COMPLETE_YEAR_DAYS).count(),
        }
    }
}

/// Length of the longest stretch of consecutive days that all have a value.
///
/// A missing value ends a run, and so does a gap of more than one day between
/// neighbouring dates.
pub fn longest_valid_run(series: &DailySeries) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;
    for (date, value) in series.iter() {
        if value.is_none() {
            current = 0;
            previous = None;
            continue;
        }
        let consecutive = previous.is_some_and(|p| (date - p).num_days() == 1);
        current = if consecutive { current + 1 } else { 1 };
        longest = longest.max(current);
        previous = Some(date);
    }
    longest
}

/// First and last date with a value, or `None` for a series without any.
pub fn valid_date_bounds(series: &DailySeries) -> Option<(NaiveDate, NaiveDate)> {
    let mut valid = series.iter().filter(|(_, v)| v.is_some()).map(|(d, _)| d);
    let first = valid.next()?;
    let last = valid.last().unwrap_or(first);
    Some((first, last))
}

/// Completeness statistics of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletenessSummary {
    pub code: String,
    pub counts: MeasurementCounts,
    pub longest_run: usize,
    pub first_valid: Option<NaiveDate>,
    pub last_valid: Option<NaiveDate>,
}

impl CompletenessSummary {
    pub fn of(series: &DailySeries) -> Self {
        let bounds = valid_date_bounds(series);
        Self {
            code: series.id.clone(),
            counts: MeasurementCounts::of(series),
            longest_run: longest_valid_run(series),
            first_valid: bounds.map(|(first, _)| first),
            last_valid: bounds.map(|(_, last)| last),
        }
    }
}

/// One row per series: `code`, the five counts, `longest_run`, `first_valid`, `last_valid`.
pub fn completeness_frame(rows: &[CompletenessSummary]) -> PolarsResult<DataFrame> {
    let count = |f: fn(&MeasurementCounts) -> usize| -> Vec<u32> {
        rows.iter().map(|r| f(&r.counts) as u32).collect()
    };
    let codes: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
    let runs: Vec<u32> = rows.iter().map(|r| r.longest_run as u32).collect();
    let first: Vec<Option<NaiveDate>> = rows.iter().map(|r| r.first_valid).collect();
    let last: Vec<Option<NaiveDate>> = rows.iter().map(|r| r.last_valid).collect();
    DataFrame::new(vec![
        Column::new("code".into(), codes),
        Column::new("num_daily_obs".into(), count(|c| c.num_daily_obs)),
        Column::new("num_monthly".into(), count(|c| c.num_monthly)),
        Column::new("num_monthly_complete".into(), count(|c| c.num_monthly_complete)),
        Column::new("num_yearly".into(), count(|c| c.num_yearly)),
        Column::new("num_yearly_complete".into(), count(|c| c.num_yearly_complete)),
        Column::new("longest_run".into(), runs),
        Column::new("first_valid".into(), first),
        Column::new("last_valid".into(), last),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn consecutive(id: &str, start: NaiveDate, values: Vec<Option<f64>>) -> DailySeries {
        let dates = (0..values.len()).map(|i| start + Duration::days(i as i64)).collect();
        DailySeries::new(id, dates, values).unwrap()
    }

    #[test]
    fn test_longest_run_resets_on_missing() {
        let nan = f64::NAN;
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates = (0..8).map(|i| start + Duration::days(i)).collect();
        let raw = [1.0, nan, 2.0, 3.0, nan, 4.0, 5.0, 6.0];
        let series = DailySeries::from_raw("S", dates, &raw, None).unwrap();
        assert_eq!(longest_valid_run(&series), 3);
    }

    #[test]
    fn test_longest_run_breaks_on_date_gap() {
        let d = |day| NaiveDate::from_ymd_opt(2020, 1, day).unwrap();
        let dates = vec![d(1), d(2), d(3), d(10), d(11)];
        let series = DailySeries::new("S", dates, vec![Some(1.0); 5]).unwrap();
        assert_eq!(longest_valid_run(&series), 3);
    }

    #[test]
    fn test_three_years_with_missing_middle_year() {
        let start = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2003, 12, 31).unwrap();
        let days = (end - start).num_days() as usize + 1;
        let values = (0..days)
            .map(|i| {
                let date = start + Duration::days(i as i64);
                (date.year() != 2002).then_some(1.0)
            })
            .collect();
        let series = consecutive("S", start, values);
        let counts = MeasurementCounts::of(&series);
        assert_eq!(counts.num_daily_obs, 730);
        assert_eq!(counts.num_yearly, 2);
        assert_eq!(counts.num_yearly_complete, 2);
        assert_eq!(counts.num_monthly, 24);
        assert_eq!(counts.num_monthly_complete, 24);
    }

    #[test]
    fn test_incomplete_months_and_years() {
        let start = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        // January complete, February 2001 has 20 of 28 days.
        let values = (0..59).map(|i| (i < 51).then_some(2.0)).collect();
        let series = consecutive("S", start, values);
        let counts = MeasurementCounts::of(&series);
        assert_eq!(counts.num_monthly, 2);
        assert_eq!(counts.num_monthly_complete, 1);
        assert_eq!(counts.num_yearly, 1);
        assert_eq!(counts.num_yearly_complete, 0);
    }

    #[test]
    fn test_valid_date_bounds() {
        let start = NaiveDate::from_ymd_opt(2015, 6, 1).unwrap();
        let series = consecutive("S", start, vec![None, Some(1.0), None, Some(2.0), None]);
        assert_eq!(
            valid_date_bounds(&series),
            Some((
                NaiveDate::from_ymd_opt(2015, 6, 2).unwrap(),
                NaiveDate::from_ymd_opt(2015, 6, 4).unwrap()
            ))
        );

        let single = consecutive("S", start, vec![None, Some(1.0)]);
        let day = NaiveDate::from_ymd_opt(2015, 6, 2).unwrap();
        assert_eq!(valid_date_bounds(&single), Some((day, day)));

        let empty = consecutive("S", start, vec![None, None]);
        assert_eq!(valid_date_bounds(&empty), None);
    }

    #[test]
    fn test_completeness_frame() -> Result<(), Box<dyn std::error::Error>> {
        let start = NaiveDate::from_ymd_opt(2015, 6, 1).unwrap();
        let rows = vec![
            CompletenessSummary::of(&consecutive("A", start, vec![Some(1.0), Some(2.0), None])),
            CompletenessSummary::of(&consecutive("B", start, vec![None, None])),
        ];
        assert_eq!(rows[0].longest_run, 2);
        let frame = completeness_frame(&rows)?;
        assert_eq!(frame.shape(), (2, 9));
        assert_eq!(frame.column("num_daily_obs")?.u32()?.get(0), Some(2));
        assert_eq!(frame.column("first_valid")?.null_count(), 1);
        Ok(())
    }
}
