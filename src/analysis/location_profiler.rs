//! Loyalty, predictability and label for every location.

use {
    crate::{
        analysis::{
            anchor_points::find_anchors,
            decay::{recency, saturation},
            predictability::PredictabilityScores,
        },
        config::{LabelThresholds, Prob, ProfilerConfig, constants},
        domain::Location,
        error::{PipelineError, PipelineResult, config_err},
        models::{LoyaltyFactors, LoyaltyLabel, Profile},
        utils::{fractional_days, harmonic_mean},
    },
    chrono::NaiveDateTime,
};

#[derive(Debug, Clone)]
pub struct LocationProfiler {
    config: ProfilerConfig,
}

impl LocationProfiler {
    pub fn new(config: ProfilerConfig) -> PipelineResult<Self> {
        config.validate()?;
        log::debug!("Initialized LocationProfiler: {:?}", config.labels);
        Ok(Self { config })
    }

    /// Recomputes a profile for every location, sorted by location id.
    ///
    /// Recency is measured from each location's last arrival to `collection_end`.
    pub fn profile(
        &self,
        locations: &[Location],
        collection_start: NaiveDateTime,
        collection_end: NaiveDateTime,
    ) -> PipelineResult<Vec<Profile>> {
        if collection_start > collection_end {
            return Err(config_err(format!(
                "collection window is inverted: {collection_start} > {collection_end}"
            )));
        }

        if locations.is_empty() {
            log::warn!(
                "{}",
                PipelineError::InsufficientData {
                    stage: "location profiling",
                    needed: 1,
                    found: 0
                }
            );
            return Ok(Vec::new());
        }

        let anchors = find_anchors(locations, &self.config.anchors);

        let mut profiles: Vec<Profile> = locations
            .iter()
            .map(|loc| {
                let mut profile = self.profile_one(loc, collection_end);
                profile.candidate_home = anchors.is_home(loc.id());
                profile.candidate_work = anchors.is_work(loc.id());
                profile
            })
            .collect();
        profiles.sort_by_key(|p| p.location_id);

        log::info!(
            "Profiled {} locations ({} anchors).",
            profiles.len(),
            profiles.iter().filter(|p| p.is_anchor()).count()
        );
        Ok(profiles)
    }

    fn profile_one(&self, location: &Location, collection_end: NaiveDateTime) -> Profile {
        let stats = location.stats();
        let days_since = fractional_days(collection_end - stats.last_visit).max(0.0);

        let factors = LoyaltyFactors {
            recency: Prob::new(recency(days_since, self.config.recency_half_life_days)),
            duration: Prob::new(saturation(
                stats.total_dwell_hours,
                self.config.dwell_half_saturation_hours,
            )),
            visits: Prob::new(saturation(
                stats.visit_count as f64,
                self.config.visit_half_saturation,
            )),
        };
        let loyalty = Prob::new(harmonic_mean(&[
            factors.recency.value(),
            factors.duration.value(),
            factors.visits.value(),
        ]));

        let scores =
            PredictabilityScores::from_series(&stats.arrival_hours, &stats.dwell_hours, &stats.gap_days);
        let predictability_index = Prob::new(scores.index());

        let label = classify(
            &self.config.labels,
            stats.visit_count,
            loyalty.value(),
            predictability_index.value(),
        );

        Profile {
            location_id: location.id(),
            centroid: location.centroid(),
            is_noise: location.is_noise(),
            visit_count: stats.visit_count,
            total_dwell_hours: stats.total_dwell_hours,
            first_visit: stats.first_visit,
            last_visit: stats.last_visit,
            days_since_last_visit: days_since,
            factors,
            loyalty,
            label,
            predictability_arrival: Prob::new(scores.arrival),
            predictability_dwell: Prob::new(scores.dwell),
            predictability_gap: Prob::new(scores.gap),
            predictability_index,
            candidate_home: false,
            candidate_work: false,
        }
    }
}

/// First label (strongest first) whose loyalty and regularity floors are both met.
pub fn classify(
    thresholds: &LabelThresholds,
    visit_count: usize,
    loyalty: f64,
    regularity: f64,
) -> LoyaltyLabel {
    if visit_count < constants::profiler::MIN_VISITS_FOR_LABEL
        || loyalty < thresholds.transient_floor()
    {
        return LoyaltyLabel::Transient;
    }

    [
        (LoyaltyLabel::Anchor, thresholds.anchor),
        (LoyaltyLabel::Habit, thresholds.habit),
        (LoyaltyLabel::Recurring, thresholds.recurring),
    ]
    .into_iter()
    .find(|(_, rule)| rule.admits(loyalty, regularity))
    .map_or(LoyaltyLabel::Transient, |(label, _)| label)
}
