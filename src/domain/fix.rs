use {
    crate::domain::GeoPoint,
    chrono::NaiveDateTime,
    serde::{Deserialize, Serialize},
};

/// One GPS position fix. Timestamps are local wall-clock time of the subject, so hour-of-day
/// and weekday come straight off the value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    pub timestamp: NaiveDateTime,
    pub point: GeoPoint,
}

impl RawFix {
    pub fn new(timestamp: NaiveDateTime, lat: f64, lon: f64) -> Self {
        RawFix {
            timestamp,
            point: GeoPoint::new(lat, lon),
        }
    }
}
