//! Typed daily time series, with missing samples held as `None`.

use chrono::NaiveDate;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Sentinel used by the gridded and tabular sources for "no measurement".
pub const MISSING_SENTINEL: f64 = -9999.0;

/// Translates a raw sample into the optional representation used everywhere else.
///
/// NaN and the source's sentinel both become `None`. This is the only place a
/// floating-point sentinel comparison happens.
pub fn ingest_value(raw: f64, sentinel: Option<f64>) -> Option<f64> {
    if raw.is_nan() {
        return None;
    }
    match sentinel {
        Some(s) if raw == s => None,
        _ => Some(raw),
    }
}

/// A daily series for one station or catchment.
///
/// `dates` and `values` always have the same length; dates are expected in
/// ascending order but need not be evenly spaced.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    pub id: String,
    dates: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
}

impl DailySeries {
    /// Builds a series from already-ingested samples.
    ///
    /// Returns `None` when the two vectors differ in length.
    pub fn new(
        id: impl Into<String>,
        dates: Vec<NaiveDate>,
        values: Vec<Option<f64>>,
    ) -> Option<Self> {
        if dates.len() != values.len() {
            return None;
        }
        Some(Self {
            id: id.into(),
            dates,
            values,
        })
    }

    /// Builds a series from raw floats, translating NaN and `sentinel` to missing.
    pub fn from_raw(
        id: impl Into<String>,
        dates: Vec<NaiveDate>,
        raw: &[f64],
        sentinel: Option<f64>,
    ) -> Option<Self> {
        let values = raw.iter().map(|v| ingest_value(*v, sentinel)).collect();
        Self::new(id, dates, values)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates `(date, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Option<f64>)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Returns a copy restricted to `start..=end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> DailySeries {
        let (dates, values): (Vec<NaiveDate>, Vec<Option<f64>>) = self
            .iter()
            .filter(|(date, _)| *date >= start && *date <= end)
            .unzip();
        DailySeries {
            id: self.id.clone(),
            dates,
            values,
        }
    }
}

/// Series keyed by station or catchment identifier, in identifier order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesTable {
    series: BTreeMap<String, DailySeries>,
}

impl SeriesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a series under its own identifier, replacing any previous one.
    pub fn insert(&mut self, series: DailySeries) -> Option<DailySeries> {
        self.series.insert(series.id.clone(), series)
    }

    pub fn get(&self, id: &str) -> Option<&DailySeries> {
        self.series.get(id)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Values<'_, String, DailySeries> {
        self.series.values()
    }
}

impl FromIterator<DailySeries> for SeriesTable {
    fn from_iter<I: IntoIterator<Item = DailySeries>>(iter: I) -> Self {
        let mut table = SeriesTable::new();
        for series in iter {
            table.insert(series);
        }
        table
    }
}

impl<'a> IntoIterator for &'a SeriesTable {
    type Item = &'a DailySeries;
    type IntoIter = btree_map::Values<'a, String, DailySeries>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.values()
    }
}
