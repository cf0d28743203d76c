//! Decay and saturation curves feeding the loyalty score.

use std::f64::consts::LN_2;

/// Exponential recency: 1.0 at `days_since == 0`, halving every `half_life_days`.
/// Negative ages are treated as 0.
pub fn recency(days_since: f64, half_life_days: f64) -> f64 {
    let age = days_since.max(0.0);
    (-LN_2 / half_life_days * age).exp()
}

/// Exponential saturation: 0.0 at `x == 0`, 0.5 at `half_point`, approaching 1.0.
pub fn saturation(x: f64, half_point: f64) -> f64 {
    let x = x.max(0.0);
    1.0 - (-LN_2 / half_point * x).exp()
}
