//! Groups daily discharge by hydrological year, keeping only usable days.
//!
//! Every per-year signature starts from the same grouping: records are bucketed by
//! their hydrological-year label, bad-quality and missing days are dropped, and a
//! year only qualifies once it has at least `threshold_days` usable days.

use crate::signatures::error::SignatureError;
use crate::types::discharge::DischargeRecord;
use crate::types::hydro_year::HydroYear;
use std::collections::BTreeMap;

/// Minimum number of usable days for a year to be evaluated.
pub const DEFAULT_THRESHOLD_DAYS: usize = 360;

/// Usable values of one hydrological year.
#[derive(Debug, Clone, PartialEq)]
pub enum YearSample {
    /// Chronological good-quality values; at least `threshold_days` of them.
    Complete(Vec<f64>),
    /// Too few usable days; holds how many there were.
    Insufficient(usize),
}

impl YearSample {
    pub fn values(&self) -> Option<&[f64]> {
        match self {
            YearSample::Complete(values) => Some(values.as_slice()),
            YearSample::Insufficient(_) => None,
        }
    }

    pub fn usable_days(&self) -> usize {
        match self {
            YearSample::Complete(values) => values.len(),
            YearSample::Insufficient(n) => *n,
        }
    }
}

/// Usable values per hydrological year, in year order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct YearGroups {
    years: BTreeMap<HydroYear, YearSample>,
}

impl YearGroups {
    /// Groups `records` (assumed chronological) under the matching entries of `labels`.
    ///
    /// Years that occur in `labels` but have no usable day are kept as
    /// [`YearSample::Insufficient`] so they still show up in the output.
    pub fn build(
        series: &str,
        records: &[DischargeRecord],
        labels: &[HydroYear],
        threshold_days: usize,
    ) -> Result<Self, SignatureError> {
        if records.len() != labels.len() {
            return Err(SignatureError::LengthMismatch {
                series: series.to_string(),
                values: records.len(),
                labels: labels.len(),
            });
        }

        let mut buckets: BTreeMap<HydroYear, Vec<f64>> = BTreeMap::new();
        for (record, year) in records.iter().zip(labels) {
            let bucket = buckets.entry(*year).or_default();
            if let Some(value) = record.usable_value() {
                bucket.push(value);
            }
        }

        let years = buckets
            .into_iter()
            .map(|(year, values)| {
                let sample = if values.len() >= threshold_days {
                    YearSample::Complete(values)
                } else {
                    YearSample::Insufficient(values.len())
                };
                (year, sample)
            })
            .collect();
        Ok(Self { years })
    }

    /// Labels `records` by their dates and groups them.
    pub fn from_records(
        series: &str,
        records: &[DischargeRecord],
        first_month: u32,
        threshold_days: usize,
    ) -> Result<Self, SignatureError> {
        let labels = records
            .iter()
            .map(|r| HydroYear::from_date(r.date, first_month))
            .collect::<Option<Vec<_>>>()
            .ok_or(SignatureError::InvalidFirstMonth(first_month))?;
        Self::build(series, records, &labels, threshold_days)
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn get(&self, year: HydroYear) -> Option<&YearSample> {
        self.years.get(&year)
    }

    pub fn iter(&self) -> impl Iterator<Item = (HydroYear, &YearSample)> {
        self.years.iter().map(|(year, sample)| (*year, sample))
    }

    /// Runs `reducer` on every qualifying year; other years map to `None`.
    pub fn reduce<R: YearReducer + ?Sized>(
        &self,
        reducer: &R,
    ) -> BTreeMap<HydroYear, Option<R::Output>> {
        self.iter()
            .map(|(year, sample)| (year, sample.values().and_then(|v| reducer.reduce(v))))
            .collect()
    }
}

/// A per-year statistic over a qualifying year's chronological values.
pub trait YearReducer {
    type Output;

    /// `values` is never empty when called through [`YearGroups::reduce`]
    /// with a positive threshold. Returns `None` when the statistic is undefined.
    fn reduce(&self, values: &[f64]) -> Option<Self::Output>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::discharge::Quality;
    use chrono::{Duration, NaiveDate};

    fn records(
        start: NaiveDate,
        n: usize,
        quality: impl Fn(usize) -> Quality,
    ) -> Vec<DischargeRecord> {
        (0..n)
            .map(|i| DischargeRecord {
                date: start + Duration::days(i as i64),
                value: Some(1.0 + i as f64),
                quality: quality(i),
            })
            .collect()
    }

    struct Count;
    impl YearReducer for Count {
        type Output = usize;
        fn reduce(&self, values: &[f64]) -> Option<usize> {
            Some(values.len())
        }
    }

    #[test]
    fn test_threshold_gates_years() {
        // Oct 2000 .. Sep 2001 is hydro year 2001 (365 days), then 200 days of 2002.
        let start = NaiveDate::from_ymd_opt(2000, 10, 1).unwrap();
        let recs = records(start, 565, |_| Quality::Good);
        let groups = YearGroups::from_records("S", &recs, 10, 360).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.get(HydroYear(2001)).unwrap().usable_days(), 365);
        assert_eq!(groups.get(HydroYear(2002)), Some(&YearSample::Insufficient(200)));

        let counts = groups.reduce(&Count);
        assert_eq!(counts[&HydroYear(2001)], Some(365));
        assert_eq!(counts[&HydroYear(2002)], None);
    }

    #[test]
    fn test_bad_quality_and_missing_days_are_dropped() {
        let start = NaiveDate::from_ymd_opt(2000, 10, 1).unwrap();
        let mut recs = records(start, 365, |i| if i < 10 { Quality::Bad } else { Quality::Good });
        recs[100].value = None;
        let groups = YearGroups::from_records("S", &recs, 10, 360).unwrap();
        assert_eq!(groups.get(HydroYear(2001)), Some(&YearSample::Insufficient(354)));

        let relaxed = YearGroups::from_records("S", &recs, 10, 354).unwrap();
        let values = relaxed.get(HydroYear(2001)).unwrap().values().unwrap();
        assert_eq!(values.len(), 354);
        // Chronological order is preserved: the first kept day is day index 10.
        assert_eq!(values[0], 11.0);
    }

    #[test]
    fn test_year_without_good_days_is_reported() {
        let start = NaiveDate::from_ymd_opt(2000, 10, 1).unwrap();
        let recs = records(start, 30, |_| Quality::Bad);
        let groups = YearGroups::from_records("S", &recs, 10, 360).unwrap();
        assert_eq!(groups.get(HydroYear(2001)), Some(&YearSample::Insufficient(0)));
    }

    #[test]
    fn test_label_length_mismatch() {
        let start = NaiveDate::from_ymd_opt(2000, 10, 1).unwrap();
        let recs = records(start, 3, |_| Quality::Good);
        let result = YearGroups::build("S", &recs, &[HydroYear(2001)], 1);
        assert!(matches!(result, Err(SignatureError::LengthMismatch { .. })));
    }

    #[test]
    fn test_invalid_first_month() {
        let start = NaiveDate::from_ymd_opt(2000, 10, 1).unwrap();
        let recs = records(start, 3, |_| Quality::Good);
        assert!(matches!(
            YearGroups::from_records("S", &recs, 0, 1),
            Err(SignatureError::InvalidFirstMonth(0))
        ));
    }
}
