use {
    crate::{
        domain::{GeoPoint, StayPoint, weighted_centroid},
        utils::{fractional_days, fractional_hours},
    },
    chrono::{NaiveDateTime, TimeDelta},
    itertools::Itertools,
    serde::{Deserialize, Serialize},
};

/// Identifier of a clustered location. Ids are dense, starting at 0.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct LocationId(pub u32);

impl LocationId {
    /// Catch-all state for locations too rarely visited to model on their own.
    pub const OTHER: Self = Self(u32::MAX);

    pub fn is_other(self) -> bool {
        self == Self::OTHER
    }
}

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_other() {
            write!(f, "other")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Aggregates over a location's visits. Recomputed whenever a `Location` is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitStats {
    pub visit_count: usize,
    /// Sum of visit dwell, in hours.
    pub total_dwell_hours: f64,
    pub first_visit: NaiveDateTime,
    pub last_visit: NaiveDateTime,
    /// Hour-of-day of each arrival, in arrival order.
    pub arrival_hours: Vec<u32>,
    /// Dwell of each visit in hours, in arrival order.
    pub dwell_hours: Vec<f64>,
    /// Days between consecutive arrivals (visit_count - 1 entries).
    pub gap_days: Vec<f64>,
}

impl VisitStats {
    /// `visits` must be non-empty and sorted by arrival.
    fn from_sorted(visits: &[StayPoint]) -> Option<Self> {
        let first = visits.first()?;
        let last = visits.last()?;

        Some(Self {
            visit_count: visits.len(),
            total_dwell_hours: fractional_hours(
                visits
                    .iter()
                    .fold(TimeDelta::zero(), |acc, sp| acc + sp.duration()),
            ),
            first_visit: first.arrival,
            last_visit: last.arrival,
            arrival_hours: visits.iter().map(StayPoint::arrival_hour).collect(),
            dwell_hours: visits.iter().map(StayPoint::dwell_hours).collect(),
            gap_days: visits
                .iter()
                .tuple_windows()
                .map(|(a, b)| fractional_days(b.arrival - a.arrival))
                .collect(),
        })
    }
}

/// A persistent place: every stay point the clusterer assigned to one density region, or a
/// single unclustered stay point (`is_noise`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    id: LocationId,
    centroid: GeoPoint,
    visits: Vec<StayPoint>,
    is_noise: bool,
    stats: VisitStats,
}

impl Location {
    /// Builds a location from its member stay points. Visits are ordered by arrival; the
    /// centroid is the fix-count weighted mean of the members. Returns None for no visits.
    pub fn new(id: LocationId, mut visits: Vec<StayPoint>, is_noise: bool) -> Option<Self> {
        visits.sort_by_key(|sp| sp.arrival);
        let stats = VisitStats::from_sorted(&visits)?;
        let centroid = weighted_centroid(
            visits
                .iter()
                .map(|sp| (&sp.centroid, sp.fix_count.max(1) as f64)),
        )?;

        Some(Self {
            id,
            centroid,
            visits,
            is_noise,
            stats,
        })
    }

    pub fn id(&self) -> LocationId {
        self.id
    }

    pub fn centroid(&self) -> GeoPoint {
        self.centroid
    }

    pub fn visits(&self) -> &[StayPoint] {
        &self.visits
    }

    /// True for stay points that fell outside every dense region.
    pub fn is_noise(&self) -> bool {
        self.is_noise
    }

    pub fn stats(&self) -> &VisitStats {
        &self.stats
    }

    pub fn visit_count(&self) -> usize {
        self.stats.visit_count
    }

    pub fn total_fix_count(&self) -> usize {
        self.visits.iter().map(|sp| sp.fix_count).sum()
    }

    pub(crate) fn with_id(mut self, id: LocationId) -> Self {
        self.id = id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2008, 10, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn stay(day: u32, hour: u32, hours: i64, lat: f64, fixes: usize) -> StayPoint {
        StayPoint {
            arrival: at(day, hour),
            departure: at(day, hour) + TimeDelta::hours(hours),
            centroid: GeoPoint::new(lat, 116.3),
            fix_count: fixes,
        }
    }

    #[test]
    fn derived_attributes_follow_arrival_order() {
        // Deliberately out of order.
        let loc = Location::new(
            LocationId(4),
            vec![stay(5, 9, 2, 39.0, 10), stay(1, 8, 1, 39.0, 10), stay(3, 20, 3, 39.0, 10)],
            false,
        )
        .unwrap();

        let stats = loc.stats();
        assert_eq!(stats.visit_count, 3);
        assert_eq!(stats.first_visit, at(1, 8));
        assert_eq!(stats.last_visit, at(5, 9));
        assert_eq!(stats.arrival_hours, vec![8, 20, 9]);
        assert_eq!(stats.dwell_hours, vec![1.0, 3.0, 2.0]);
        assert_eq!(stats.total_dwell_hours, 6.0);
        assert_eq!(stats.gap_days.len(), 2);
        assert!((stats.gap_days[0] - (2.0 + 12.0 / 24.0)).abs() < 1e-9);
    }

    #[test]
    fn centroid_is_weighted_by_fix_count() {
        let loc = Location::new(
            LocationId(0),
            vec![stay(1, 8, 1, 39.0, 3), stay(2, 8, 1, 40.0, 1)],
            false,
        )
        .unwrap();
        assert!((loc.centroid().lat - 39.25).abs() < 1e-12);
        assert_eq!(loc.total_fix_count(), 4);
    }

    #[test]
    fn empty_membership_yields_no_location() {
        assert!(Location::new(LocationId(0), Vec::new(), true).is_none());
    }

    #[test]
    fn other_id_displays_as_other() {
        assert_eq!(LocationId::OTHER.to_string(), "other");
        assert_eq!(LocationId(7).to_string(), "7");
    }
}
