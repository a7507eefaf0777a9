//! Day-of-year bound check: flags values outside `mean ± k·std` of their calendar day.

use crate::audit::error::AuditError;
use crate::types::daily_series::{DailySeries, SeriesTable};
use bon::bon;
use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_STD_MULTIPLIER: f64 = 10.0;
/// Entries in a day-of-year reference, one per calendar ordinal (1..=366).
pub const REFERENCE_DAYS: usize = 366;

fn day_index(date: NaiveDate) -> usize {
    date.ordinal0() as usize
}

/// Mean and standard deviation per day of year.
#[derive(Debug, Clone, PartialEq)]
pub struct DayOfYearReference {
    mean: Vec<Option<f64>>,
    std: Vec<Option<f64>>,
}

impl DayOfYearReference {
    pub fn new(mean: Vec<Option<f64>>, std: Vec<Option<f64>>) -> Result<Self, AuditError> {
        if mean.len() != std.len() {
            return Err(AuditError::LengthMismatch {
                mean: mean.len(),
                std: std.len(),
            });
        }
        if mean.len() != REFERENCE_DAYS {
            return Err(AuditError::ReferenceLength {
                series: "mean",
                found: mean.len(),
            });
        }
        Ok(Self { mean, std })
    }

    /// Builds the reference from the series itself.
    ///
    /// The standard deviation is the sample estimate; days with fewer than two
    /// values have none, days without any value have no mean either.
    pub fn from_series(series: &DailySeries) -> Self {
        let mut samples: Vec<Vec<f64>> = vec![Vec::new(); REFERENCE_DAYS];
        for (date, value) in series.iter() {
            if let Some(v) = value {
                samples[day_index(date)].push(v);
            }
        }

        let (mean, std): (Vec<Option<f64>>, Vec<Option<f64>>) = samples
            .iter()
            .map(|values| {
                if values.is_empty() {
                    return (None, None);
                }
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                let std = (values.len() > 1).then(|| {
                    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
                    (ss / (n - 1.0)).sqrt()
                });
                (Some(mean), std)
            })
            .unzip();
        Self { mean, std }
    }

    pub fn mean(&self, date: NaiveDate) -> Option<f64> {
        self.mean[day_index(date)]
    }

    pub fn std(&self, date: NaiveDate) -> Option<f64> {
        self.std[day_index(date)]
    }

    /// `(lower, upper)` bound for `date`, if the reference covers that day.
    pub fn bounds(&self, date: NaiveDate, std_multiplier: f64) -> Option<(f64, f64)> {
        let mean = self.mean(date)?;
        let spread = std_multiplier * self.std(date)?;
        Some((mean - spread, mean + spread))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Above,
    Below,
}

impl Bound {
    pub fn as_str(self) -> &'static str {
        match self {
            Bound::Above => "above",
            Bound::Below => "below",
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exceedance {
    pub date: NaiveDate,
    pub value: f64,
    pub bound: Bound,
}

/// Result of checking one series.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierReport {
    pub code: String,
    pub exceedances: Vec<Exceedance>,
    /// `true` where the input value was flagged; same length as the input series.
    pub mask: Vec<bool>,
}

impl OutlierReport {
    pub fn flagged(&self) -> usize {
        self.exceedances.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierCheck {
    std_multiplier: f64,
}

impl Default for OutlierCheck {
    fn default() -> Self {
        Self {
            std_multiplier: DEFAULT_STD_MULTIPLIER,
        }
    }
}

#[bon]
impl OutlierCheck {
    #[builder]
    pub fn new(
        #[builder(default = DEFAULT_STD_MULTIPLIER)] std_multiplier: f64,
    ) -> Result<Self, AuditError> {
        if !std_multiplier.is_finite() || std_multiplier < 0.0 {
            return Err(AuditError::InvalidMultiplier(std_multiplier));
        }
        Ok(Self { std_multiplier })
    }

    pub fn std_multiplier(&self) -> f64 {
        self.std_multiplier
    }

    /// Flags every value strictly above or below its day's bound.
    ///
    /// Missing values and days the reference does not cover are never flagged.
    pub fn check(&self, series: &DailySeries, reference: &DayOfYearReference) -> OutlierReport {
        let mut exceedances = Vec::new();
        let mask = series
            .iter()
            .map(|(date, value)| {
                let bounds = reference.bounds(date, self.std_multiplier);
                let (Some(value), Some((lower, upper))) = (value, bounds) else {
                    return false;
                };
                let bound = if value > upper {
                    Bound::Above
                } else if value < lower {
                    Bound::Below
                } else {
                    return false;
                };
                exceedances.push(Exceedance { date, value, bound });
                true
            })
            .collect();

        debug!("Series {}: {} values outside the day-of-year bounds", series.id, exceedances.len());
        OutlierReport {
            code: series.id.clone(),
            exceedances,
            mask,
        }
    }

    /// Checks every series that has a reference; series without one are logged and skipped.
    pub fn check_table(
        &self,
        table: &SeriesTable,
        references: &BTreeMap<String, DayOfYearReference>,
    ) -> Vec<OutlierReport> {
        table
            .iter()
            .filter_map(|series| match references.get(&series.id) {
                Some(reference) => Some(self.check(series, reference)),
                None => {
                    warn!(
                        "No day-of-year reference for series {}, skipping bound check",
                        series.id
                    );
                    None
                }
            })
            .collect()
    }

    /// Checks every series against a reference built from its own values.
    pub fn check_table_self_referenced(&self, table: &SeriesTable) -> Vec<OutlierReport> {
        table
            .iter()
            .map(|series| self.check(series, &DayOfYearReference::from_series(series)))
            .collect()
    }
}

/// Flattens reports into `code, date, value, bound`.
pub fn exceedance_frame(reports: &[OutlierReport]) -> PolarsResult<DataFrame> {
    let rows = reports
        .iter()
        .flat_map(|r| r.exceedances.iter().map(move |e| (r.code.as_str(), e)));
    let mut codes = Vec::new();
    let mut dates = Vec::new();
    let mut values = Vec::new();
    let mut bounds = Vec::new();
    for (code, exceedance) in rows {
        codes.push(code);
        dates.push(exceedance.date);
        values.push(exceedance.value);
        bounds.push(exceedance.bound.as_str());
    }
    DataFrame::new(vec![
        Column::new("code".into(), codes),
        Column::new("date".into(), dates),
        Column::new("value".into(), values),
        Column::new("bound".into(), bounds),
    ])
}
