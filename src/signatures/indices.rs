//! Whole-series hydrological indices.

use crate::types::daily_series::DailySeries;
use ordered_float::OrderedFloat;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Percentile of sorted samples using linear interpolation between the closest ranks.
fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Difference between the 75th and 25th percentile of the present values.
///
/// `None` when fewer than `min_count` values are present.
pub fn interquartile_range(values: &[Option<f64>], min_count: usize) -> Option<f64> {
    let mut present: Vec<OrderedFloat<f64>> =
        values.iter().flatten().map(|v| OrderedFloat(*v)).collect();
    if present.is_empty() || present.len() < min_count {
        return None;
    }
    present.sort_unstable();
    let sorted: Vec<f64> = present.into_iter().map(OrderedFloat::into_inner).collect();
    Some(percentile(&sorted, 0.75)? - percentile(&sorted, 0.25)?)
}

/// Converts discharge in m³/s into specific discharge in mm/day over `area_km2`.
///
/// Negative discharge is treated as missing. A non-positive or non-finite area
/// yields a series without any value.
pub fn specific_discharge(discharge: &DailySeries, area_km2: f64) -> DailySeries {
    let valid_area = area_km2.is_finite() && area_km2 > 0.0;
    let values = discharge
        .values()
        .iter()
        .map(|value| {
            let q = (*value).filter(|q| *q >= 0.0)?;
            valid_area.then(|| q * SECONDS_PER_DAY * 1_000.0 / (area_km2 * 1_000_000.0))
        })
        .collect();
    DailySeries::new(discharge.id.clone(), discharge.dates().to_vec(), values)
        .unwrap_or_else(|| discharge.clone())
}
