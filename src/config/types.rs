//! Small value types shared by the configuration and the models.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// A probability-like score clamped to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Prob(f64);

impl Prob {
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);

    /// NaN collapses to 0.0.
    pub const fn new(val: f64) -> Self {
        let v = if val.is_nan() || val < 0.0 {
            0.0
        } else if val > 1.0 {
            1.0
        } else {
            val
        };
        Self(v)
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Prob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.0 * 100.0)
    }
}

/// Great-circle distance in meters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Meters(f64);

impl Meters {
    pub const fn new(val: f64) -> Self {
        Self(val)
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0.0 && self.0.is_finite()
    }
}

impl std::fmt::Display for Meters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 >= 1000.0 {
            write!(f, "{:.2}km", self.0 / 1000.0)
        } else {
            write!(f, "{:.0}m", self.0)
        }
    }
}

/// How completely the device sampled during a time window (overnight or office hours).
/// Sparse data gets the permissive anchor test, dense data the strict overlap test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter, Default)]
pub enum Coverage {
    #[default]
    #[strum(to_string = "sparse")]
    Sparse,
    #[strum(to_string = "dense")]
    Dense,
}
