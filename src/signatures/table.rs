use crate::signatures::error::SignatureError;
use crate::signatures::grouping::{YearGroups, YearReducer, DEFAULT_THRESHOLD_DAYS};
use crate::signatures::reducers::{CenterTiming, GiniCoefficient, MaxFlowDay, MinFlowDay};
use crate::types::daily_series::{DailySeries, SeriesTable};
use crate::types::discharge::{pair_with_quality, QualityTable};
use crate::types::hydro_year::{HydroYear, DEFAULT_FIRST_MONTH};
use bon::Builder;
use log::debug;
use polars::prelude::*;

/// All per-year signatures of one station and hydrological year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlySignatures {
    pub code: String,
    pub hydro_year: HydroYear,
    pub usable_days: usize,
    pub center_timing: Option<u32>,
    pub min_flow_day: Option<u32>,
    pub max_flow_day: Option<u32>,
    pub gini: Option<f64>,
}

/// Computes yearly streamflow signatures for discharge series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct SignatureEngine {
    /// Month in which the hydrological year starts.
    #[builder(default = DEFAULT_FIRST_MONTH)]
    first_month: u32,
    /// Usable days a year needs before any signature is computed.
    #[builder(default = DEFAULT_THRESHOLD_DAYS)]
    threshold_days: usize,
}

impl Default for SignatureEngine {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SignatureEngine {
    pub fn first_month(&self) -> u32 {
        self.first_month
    }

    pub fn threshold_days(&self) -> usize {
        self.threshold_days
    }

    /// Groups one station's discharge by hydrological year.
    ///
    /// Without a quality series every present value is considered good.
    pub fn group(
        &self,
        discharge: &DailySeries,
        quality: Option<&DailySeries>,
    ) -> Result<YearGroups, SignatureError> {
        let records = pair_with_quality(discharge, quality);
        YearGroups::from_records(&discharge.id, &records, self.first_month, self.threshold_days)
    }

    /// Signatures of every hydrological year in `discharge`, in year order.
    pub fn station(
        &self,
        discharge: &DailySeries,
        quality: Option<&DailySeries>,
    ) -> Result<Vec<YearlySignatures>, SignatureError> {
        let groups = self.group(discharge, quality)?;
        let signatures: Vec<YearlySignatures> = groups
            .iter()
            .map(|(year, sample)| {
                let values = sample.values();
                let apply = |reducer: &dyn YearReducer<Output = u32>| {
                    values.and_then(|v| reducer.reduce(v))
                };
                YearlySignatures {
                    code: discharge.id.clone(),
                    hydro_year: year,
                    usable_days: sample.usable_days(),
                    center_timing: apply(&CenterTiming),
                    min_flow_day: apply(&MinFlowDay),
                    max_flow_day: apply(&MaxFlowDay),
                    gini: values.and_then(|v| GiniCoefficient.reduce(v)),
                }
            })
            .collect();

        let computed = signatures.iter().filter(|s| s.center_timing.is_some()).count();
        debug!(
            "Station {}: {} of {} hydrological years meet the {}-day threshold",
            discharge.id,
            computed,
            signatures.len(),
            self.threshold_days
        );
        Ok(signatures)
    }

    /// Signatures of every station in `discharge`, paired with its quality series by identifier.
    pub fn table(
        &self,
        discharge: &SeriesTable,
        quality: &QualityTable,
    ) -> Result<Vec<YearlySignatures>, SignatureError> {
        let mut rows = Vec::new();
        for series in discharge {
            rows.extend(self.station(series, quality.get(&series.id))?);
        }
        Ok(rows)
    }
}

/// Collects signatures into
/// `code, hydro_year, usable_days, center_timing, min_flow_day, max_flow_day, gini`.
pub fn signatures_frame(rows: &[YearlySignatures]) -> PolarsResult<DataFrame> {
    let codes: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
    let years: Vec<i32> = rows.iter().map(|r| r.hydro_year.get()).collect();
    let usable: Vec<u32> = rows.iter().map(|r| r.usable_days as u32).collect();
    let center: Vec<Option<u32>> = rows.iter().map(|r| r.center_timing).collect();
    let min_day: Vec<Option<u32>> = rows.iter().map(|r| r.min_flow_day).collect();
    let max_day: Vec<Option<u32>> = rows.iter().map(|r| r.max_flow_day).collect();
    let gini: Vec<Option<f64>> = rows.iter().map(|r| r.gini).collect();
    DataFrame::new(vec![
        Column::new("code".into(), codes),
        Column::new("hydro_year".into(), years),
        Column::new("usable_days".into(), usable),
        Column::new("center_timing".into(), center),
        Column::new("min_flow_day".into(), min_day),
        Column::new("max_flow_day".into(), max_day),
        Column::new("gini".into(), gini),
    ])
}
