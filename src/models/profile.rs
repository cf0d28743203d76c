use {
    crate::{
        config::Prob,
        domain::{GeoPoint, LocationId},
    },
    chrono::NaiveDateTime,
    serde::{Deserialize, Serialize},
    strum_macros::{Display, EnumIter},
};

/// Qualitative place category, strongest first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    Default,
)]
pub enum LoyaltyLabel {
    /// Home, workplace: high loyalty and a regular rhythm.
    #[strum(to_string = "Anchor")]
    Anchor,

    #[strum(to_string = "Habit")]
    Habit,

    #[strum(to_string = "Recurring")]
    Recurring,

    #[strum(to_string = "Transient")]
    #[default]
    Transient,
}

/// Loyalty components before they are combined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LoyaltyFactors {
    pub recency: Prob,
    pub duration: Prob,
    pub visits: Prob,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub location_id: LocationId,
    pub centroid: GeoPoint,
    pub is_noise: bool,

    pub visit_count: usize,
    pub total_dwell_hours: f64,
    pub first_visit: NaiveDateTime,
    pub last_visit: NaiveDateTime,
    /// Days from the last arrival to the end of collection.
    pub days_since_last_visit: f64,

    pub factors: LoyaltyFactors,
    /// Harmonic mean of the three factors.
    pub loyalty: Prob,
    pub label: LoyaltyLabel,

    pub predictability_arrival: Prob,
    pub predictability_dwell: Prob,
    pub predictability_gap: Prob,
    /// Mean of the three predictability indices. Doubles as "regularity" in labelling.
    pub predictability_index: Prob,

    pub candidate_home: bool,
    pub candidate_work: bool,
}

impl Profile {
    pub fn is_anchor(&self) -> bool {
        self.label == LoyaltyLabel::Anchor
    }
}

/// Highest-loyalty home candidate; falls back to the most loyal location overall.
pub fn likely_home(profiles: &[Profile]) -> Option<&Profile> {
    fn most_loyal<'a>(candidates: impl Iterator<Item = &'a Profile>) -> Option<&'a Profile> {
        candidates.max_by(|a, b| {
            a.loyalty
                .value()
                .total_cmp(&b.loyalty.value())
                // Lower id wins ties.
                .then(b.location_id.cmp(&a.location_id))
        })
    }

    most_loyal(profiles.iter().filter(|p| p.candidate_home)).or_else(|| most_loyal(profiles.iter()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use strum::IntoEnumIterator;

    fn profile(id: u32, loyalty: f64, home: bool) -> Profile {
        let ts = NaiveDate::from_ymd_opt(2009, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Profile {
            location_id: LocationId(id),
            centroid: GeoPoint::new(39.9, 116.3),
            is_noise: false,
            visit_count: 3,
            total_dwell_hours: 5.0,
            first_visit: ts,
            last_visit: ts,
            days_since_last_visit: 0.0,
            factors: LoyaltyFactors::default(),
            loyalty: Prob::new(loyalty),
            label: LoyaltyLabel::Recurring,
            predictability_arrival: Prob::ZERO,
            predictability_dwell: Prob::ZERO,
            predictability_gap: Prob::ZERO,
            predictability_index: Prob::ZERO,
            candidate_home: home,
            candidate_work: false,
        }
    }

    #[test]
    fn labels_iterate_strongest_first() {
        let order: Vec<String> = LoyaltyLabel::iter().map(|l| l.to_string()).collect();
        assert_eq!(order, vec!["Anchor", "Habit", "Recurring", "Transient"]);
        assert!(LoyaltyLabel::Anchor < LoyaltyLabel::Transient);
    }

    #[test]
    fn likely_home_prefers_home_candidates() {
        let profiles = vec![
            profile(0, 0.9, false),
            profile(1, 0.4, true),
            profile(2, 0.6, true),
        ];
        assert_eq!(likely_home(&profiles).unwrap().location_id, LocationId(2));
    }

    #[test]
    fn likely_home_falls_back_to_loyalty() {
        let profiles = vec![profile(0, 0.3, false), profile(1, 0.7, false)];
        assert_eq!(likely_home(&profiles).unwrap().location_id, LocationId(1));
        assert!(likely_home(&[]).is_none());
    }

    #[test]
    fn likely_home_ties_go_to_lower_id() {
        let profiles = vec![profile(3, 0.5, false), profile(1, 0.5, false)];
        assert_eq!(likely_home(&profiles).unwrap().location_id, LocationId(1));
    }
}
