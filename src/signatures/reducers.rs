//! Per-year streamflow signatures.
//!
//! Day positions are 1-based and count days of the year's usable subsequence,
//! so for a complete year starting on 1 October, day 1 is 1 October.

use crate::signatures::grouping::YearReducer;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;

/// Centre timing: the first day by which half of the year's volume has passed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CenterTiming;

impl YearReducer for CenterTiming {
    type Output = u32;

    fn reduce(&self, values: &[f64]) -> Option<u32> {
        if values.is_empty() {
            return None;
        }
        let half = 0.5 * values.iter().sum::<f64>();
        let mut cumulative = 0.0;
        for (i, value) in values.iter().enumerate() {
            cumulative += value;
            if cumulative >= half {
                return Some(i as u32 + 1);
            }
        }
        None
    }
}

/// Day of the lowest flow. Ties go to the earliest day.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinFlowDay;

impl YearReducer for MinFlowDay {
    type Output = u32;

    fn reduce(&self, values: &[f64]) -> Option<u32> {
        values
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| OrderedFloat(**v))
            .map(|(i, _)| i as u32 + 1)
    }
}

/// Day of the highest flow. Ties go to the earliest day.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxFlowDay;

impl YearReducer for MaxFlowDay {
    type Output = u32;

    fn reduce(&self, values: &[f64]) -> Option<u32> {
        values
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| Reverse(OrderedFloat(**v)))
            .map(|(i, _)| i as u32 + 1)
    }
}

/// Gini coefficient of the year's daily flows: 0 for perfectly even flow,
/// `(n - 1) / n` when everything passes on a single day.
///
/// Undefined when the year's total flow is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct GiniCoefficient;

impl YearReducer for GiniCoefficient {
    type Output = f64;

    fn reduce(&self, values: &[f64]) -> Option<f64> {
        let total: f64 = values.iter().sum();
        if values.is_empty() || total == 0.0 || !total.is_finite() {
            return None;
        }
        let mut shares: Vec<OrderedFloat<f64>> =
            values.iter().map(|v| OrderedFloat(v / total)).collect();
        shares.sort_unstable();
        let n = shares.len() as f64;
        let ranked: f64 = shares
            .iter()
            .enumerate()
            .map(|(i, share)| (i + 1) as f64 * share.into_inner())
            .sum();
        Some((2.0 * ranked - (n + 1.0)) / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_timing_uniform_year() {
        let values = vec![2.5; 365];
        assert_eq!(CenterTiming.reduce(&values), Some(183));
    }

    #[test]
    fn test_center_timing_front_loaded() {
        let mut values = vec![0.0; 365];
        values[9] = 100.0;
        assert_eq!(CenterTiming.reduce(&values), Some(10));
    }

    #[test]
    fn test_center_timing_empty() {
        assert_eq!(CenterTiming.reduce(&[]), None);
    }

    #[test]
    fn test_extreme_days() {
        let values = [3.0, 1.0, 5.0, 1.0, 5.0, 2.0];
        assert_eq!(MinFlowDay.reduce(&values), Some(2));
        assert_eq!(MaxFlowDay.reduce(&values), Some(3));
        assert_eq!(MinFlowDay.reduce(&[]), None);
    }

    #[test]
    fn test_gini_even_flow_is_zero() {
        let values = vec![7.0; 365];
        let gini = GiniCoefficient.reduce(&values).unwrap();
        assert!(gini.abs() < 1e-9, "gini = {gini}");
    }

    #[test]
    fn test_gini_single_day() {
        let mut values = vec![0.0; 365];
        values[200] = 42.0;
        let gini = GiniCoefficient.reduce(&values).unwrap();
        assert!((gini - 364.0 / 365.0).abs() < 1e-12);
    }

    #[test]
    fn test_gini_zero_flow_not_computable() {
        assert_eq!(GiniCoefficient.reduce(&[0.0; 10]), None);
    }
}
