//! Daily discharge records with their quality flags.

use crate::types::daily_series::DailySeries;
use chrono::NaiveDate;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Quality flag attached to a daily discharge value.
///
/// Source tables encode good data as `0` and everything else as bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    Good,
    Bad,
}

impl Quality {
    /// Maps a numeric quality code. A missing code counts as bad.
    pub fn from_code(code: Option<f64>) -> Self {
        match code {
            Some(c) if c == 0.0 => Quality::Good,
            _ => Quality::Bad,
        }
    }

    pub fn is_good(self) -> bool {
        self == Quality::Good
    }
}

/// One day of discharge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DischargeRecord {
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub quality: Quality,
}

impl DischargeRecord {
    /// A record is usable for signatures when it is flagged good and has a value.
    pub fn usable_value(&self) -> Option<f64> {
        if self.quality.is_good() {
            self.value
        } else {
            None
        }
    }
}

/// Pairs a discharge series with its quality series, day by day.
///
/// Days present in `discharge` but absent from `quality` are flagged bad.
pub fn pair_with_quality(
    discharge: &DailySeries,
    quality: Option<&DailySeries>,
) -> Vec<DischargeRecord> {
    let flags: BTreeMap<NaiveDate, Option<f64>> = quality
        .map(|q| q.iter().collect())
        .unwrap_or_default();
    discharge
        .iter()
        .map(|(date, value)| DischargeRecord {
            date,
            value,
            quality: match quality {
                Some(_) => Quality::from_code(flags.get(&date).copied().flatten()),
                None => Quality::Good,
            },
        })
        .collect()
}

/// Quality series keyed by station identifier.
#[derive(Debug, Clone, Default)]
pub struct QualityTable {
    flags: BTreeMap<String, DailySeries>,
}

impl QualityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, series: DailySeries) {
        self.flags.insert(series.id.clone(), series);
    }

    pub fn get(&self, id: &str) -> Option<&DailySeries> {
        self.flags.get(id)
    }

    pub fn iter(&self) -> btree_map::Values<'_, String, DailySeries> {
        self.flags.values()
    }
}

impl FromIterator<DailySeries> for QualityTable {
    fn from_iter<I: IntoIterator<Item = DailySeries>>(iter: I) -> Self {
        let mut table = QualityTable::new();
        for series in iter {
            table.insert(series);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2001, 1, d).unwrap()
    }

    #[test]
    fn test_quality_codes() {
        assert_eq!(Quality::from_code(Some(0.0)), Quality::Good);
        assert_eq!(Quality::from_code(Some(1.0)), Quality::Bad);
        assert_eq!(Quality::from_code(None), Quality::Bad);
    }

    #[test]
    fn test_pair_with_quality() {
        let dates = vec![date(1), date(2), date(3)];
        let q = DailySeries::new("X", dates, vec![Some(1.0), Some(2.0), None]).unwrap();
        let flags =
            DailySeries::new("X", vec![date(1), date(2)], vec![Some(0.0), Some(1.0)]).unwrap();
        let records = pair_with_quality(&q, Some(&flags));
        let qualities: Vec<Quality> = records.iter().map(|r| r.quality).collect();
        assert_eq!(qualities, vec![Quality::Good, Quality::Bad, Quality::Bad]);
        assert_eq!(records[0].usable_value(), Some(1.0));
        assert_eq!(records[1].usable_value(), None);
    }

    #[test]
    fn test_pair_without_quality_is_all_good() {
        let q = DailySeries::new("X", vec![date(1)], vec![Some(4.0)]).unwrap();
        let records = pair_with_quality(&q, None);
        assert_eq!(records[0].quality, Quality::Good);
    }
}
