//! Predictability index: how tightly a series clusters relative to its spread.

use crate::{
    error::PipelineError,
    utils::{clamp_unit, mean, min_max},
};

/// `clip(mean / (max - min), 0, 1)`.
///
/// Degenerate inputs resolve to a sentinel instead of faulting:
/// fewer than two values or a zero mean give 0, and a constant series with a non-zero mean
/// (zero range) gives 1. A negative mean over a positive range clips to 0.
pub fn predictability(values: &[f64]) -> f64 {
    if values.len() < 2 {
        log::debug!("{}", PipelineError::DegenerateMetric("predictability of fewer than 2 values"));
        return 0.0;
    }

    let (Some(avg), Some((min, max))) = (mean(values), min_max(values)) else {
        return 0.0;
    };

    if avg == 0.0 || !avg.is_finite() {
        log::debug!("{}", PipelineError::DegenerateMetric("predictability of a zero-mean series"));
        return 0.0;
    }

    let range = max - min;
    if range <= 0.0 {
        log::debug!("{}", PipelineError::DegenerateMetric("predictability of a constant series"));
        return 1.0;
    }

    clamp_unit(avg / range)
}

/// Per-visit series of a location, scored independently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictabilityScores {
    pub arrival: f64,
    pub dwell: f64,
    pub gap: f64,
}

impl PredictabilityScores {
    pub fn from_series(arrival_hours: &[u32], dwell_hours: &[f64], gap_days: &[f64]) -> Self {
        let arrivals: Vec<f64> = arrival_hours.iter().map(|&h| h as f64).collect();
        Self {
            arrival: predictability(&arrivals),
            dwell: predictability(dwell_hours),
            gap: predictability(gap_days),
        }
    }

    /// Mean of the three indices.
    pub fn index(&self) -> f64 {
        (self.arrival + self.dwell + self.gap) / 3.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_inputs_use_sentinels() {
        assert_eq!(predictability(&[]), 0.0);
        assert_eq!(predictability(&[5.0]), 0.0);
        assert_eq!(predictability(&[0.0, 0.0]), 0.0);
        assert_eq!(predictability(&[3.0, 3.0, 3.0]), 1.0);
    }

    #[test]
    fn constant_series_is_fully_predictable_for_any_non_zero_mean() {
        assert_eq!(predictability(&[-2.0, -2.0]), 1.0);
        assert_eq!(predictability(&[0.25, 0.25, 0.25, 0.25]), 1.0);
        assert_eq!(predictability(&[-1.0, 1.0]), 0.0);
        assert_eq!(predictability(&[-3.0, -1.0]), 0.0);
    }

    #[test]
    fn wide_spread_lowers_the_index() {
        // mean 12, range 2 -> clipped to 1
        assert_eq!(predictability(&[11.0, 12.0, 13.0]), 1.0);
        // mean 2, range 4 -> 0.5
        assert!((predictability(&[0.0, 2.0, 4.0]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn output_stays_in_unit_interval() {
        let series = [
            vec![-5.0, 1.0, 2.0],
            vec![0.1, 100.0],
            vec![23.0, 0.0, 12.0, 7.0],
            vec![1e-9, 2e-9],
        ];
        for s in &series {
            let p = predictability(s);
            assert!((0.0..=1.0).contains(&p), "{s:?} -> {p}");
        }
    }

    #[test]
    fn composite_index_is_the_mean() {
        let scores = PredictabilityScores::from_series(&[8, 8], &[0.0, 2.0, 4.0], &[1.0]);
        assert_eq!(scores.arrival, 1.0);
        assert!((scores.dwell - 0.5).abs() < 1e-12);
        assert_eq!(scores.gap, 0.0);
        assert!((scores.index() - 0.5).abs() < 1e-12);
    }
}
