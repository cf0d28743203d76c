use {
    crate::{domain::GeoPoint, utils::fractional_hours},
    chrono::{NaiveDateTime, TimeDelta, Timelike},
    serde::{Deserialize, Serialize},
};

/// A run of consecutive fixes where the subject stayed put.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StayPoint {
    pub arrival: NaiveDateTime,
    pub departure: NaiveDateTime,
    pub centroid: GeoPoint,
    pub fix_count: usize,
}

impl StayPoint {
    pub fn duration(&self) -> TimeDelta {
        self.departure - self.arrival
    }

    pub fn dwell_hours(&self) -> f64 {
        fractional_hours(self.duration())
    }

    pub fn arrival_hour(&self) -> u32 {
        self.arrival.hour()
    }
}
