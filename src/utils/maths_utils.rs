use argminmax::ArgMinMax;
use statrs::statistics::Statistics;

/// Arithmetic mean. Returns None for an empty slice.
#[inline]
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().mean())
}

/// (min, max) of a slice. Returns None for an empty slice.
#[inline]
pub fn min_max(data: &[f64]) -> Option<(f64, f64)> {
    if data.is_empty() {
        return None;
    }
    let (min_idx, max_idx) = data.argminmax();
    Some((data[min_idx], data[max_idx]))
}

/// Clamps into [0, 1]; NaN maps to 0.
#[inline]
pub fn clamp_unit(val: f64) -> f64 {
    if val.is_nan() { 0.0 } else { val.clamp(0.0, 1.0) }
}

/// Harmonic mean of strictly positive values. Any zero (or negative) term makes the result 0,
/// which is the limit of the formula and avoids dividing by zero.
pub fn harmonic_mean(values: &[f64]) -> f64 {
    if values.is_empty() || values.iter().any(|&v| v <= 0.0 || v.is_nan()) {
        return 0.0;
    }
    let reciprocal_sum: f64 = values.iter().map(|v| 1.0 / v).sum();
    values.len() as f64 / reciprocal_sum
}
