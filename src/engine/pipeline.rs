//! One user's run through every stage: fixes → stay points → locations → profiles and
//! transition model.

use {
    crate::{
        analysis::{
            LocationProfiler, StayPointClusterer, StayPointDetector, collapse_rare_states,
            davies_bouldin_index, evaluate, train_test_split,
        },
        config::PipelineConfig,
        domain::{Location, LocationId, RawFix, StayPoint},
        error::{PipelineError, PipelineResult},
        models::{EvaluationMetrics, Profile, TransitionModel, VisitEvent, likely_home},
        trace_time,
        utils::to_time_delta,
    },
    chrono::NaiveDateTime,
    serde::{Deserialize, Serialize},
    std::collections::HashMap,
};

/// Everything one run produces for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserReport {
    pub user_id: String,
    pub fix_count: usize,
    pub collection_start: Option<NaiveDateTime>,
    pub collection_end: Option<NaiveDateTime>,
    pub stay_points: Vec<StayPoint>,
    pub locations: Vec<Location>,
    /// Clustering quality over the dense locations. Lower is better.
    pub davies_bouldin: Option<f64>,
    pub profiles: Vec<Profile>,
    pub likely_home: Option<LocationId>,
    /// Visit sequence fed to the transition model, after rare-state collapsing.
    pub visit_sequence: Vec<LocationId>,
    pub model: Option<TransitionModel>,
    pub evaluation: Option<EvaluationMetrics>,
}

impl UserReport {
    pub fn noise_count(&self) -> usize {
        self.locations.iter().filter(|l| l.is_noise()).count()
    }
}

/// Stage objects built once from a validated config. Holds no per-run state, so one
/// instance can serve many users concurrently.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    detector: StayPointDetector,
    clusterer: StayPointClusterer,
    profiler: LocationProfiler,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.transition.validate()?;
        Ok(Self {
            detector: StayPointDetector::new(config.detector)?,
            clusterer: StayPointClusterer::new(config.clusterer)?,
            profiler: LocationProfiler::new(config.profiler)?,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage on one user's chronologically ordered fixes.
    pub fn run(&self, user_id: &str, fixes: &[RawFix]) -> PipelineResult<UserReport> {
        log::info!("[{}] Running pipeline over {} fixes.", user_id, fixes.len());

        let stay_points: Vec<StayPoint> = trace_time!("detect stay points", 50_000, {
            self.detector.detect(fixes)?.collect()
        });
        log::info!("[{}] {} stay points detected.", user_id, stay_points.len());

        let locations = trace_time!("cluster stay points", 50_000, {
            self.clusterer.cluster(stay_points.clone())
        });
        let davies_bouldin = davies_bouldin_index(&locations);

        let collection_start = fixes.first().map(|f| f.timestamp);
        let collection_end = fixes.last().map(|f| f.timestamp);

        let profiles = match (collection_start, collection_end) {
            (Some(start), Some(end)) => trace_time!("profile locations", 20_000, {
                self.profiler.profile(&locations, start, end)?
            }),
            _ => Vec::new(),
        };
        let likely_home = likely_home(&profiles).map(|p| p.location_id);

        let visits = self.visit_events(&locations);
        let visit_sequence: Vec<LocationId> = visits.iter().map(|v| v.location_id).collect();
        let (model, evaluation) = self.model_transitions(user_id, &visits);

        Ok(UserReport {
            user_id: user_id.to_string(),
            fix_count: fixes.len(),
            collection_start,
            collection_end,
            stay_points,
            locations,
            davies_bouldin,
            profiles,
            likely_home,
            visit_sequence,
            model,
            evaluation,
        })
    }

    /// Every visit in arrival order, with rarely visited locations folded into one state.
    fn visit_events(&self, locations: &[Location]) -> Vec<VisitEvent> {
        let mut visits: Vec<VisitEvent> = locations
            .iter()
            .flat_map(|loc| {
                loc.visits().iter().map(|sp| VisitEvent {
                    location_id: loc.id(),
                    arrival: sp.arrival,
                    departure: sp.departure,
                })
            })
            .collect();
        visits.sort_by_key(|v| (v.arrival, v.location_id));

        let min_visits = self.config.transition.min_state_visits;
        if min_visits > 1 {
            let counts: HashMap<LocationId, usize> =
                locations.iter().map(|l| (l.id(), l.visit_count())).collect();
            let ids: Vec<LocationId> = visits.iter().map(|v| v.location_id).collect();
            for (visit, id) in visits.iter_mut().zip(collapse_rare_states(&ids, &counts, min_visits)) {
                visit.location_id = id;
            }
        }
        visits
    }

    fn model_transitions(
        &self,
        user_id: &str,
        visits: &[VisitEvent],
    ) -> (Option<TransitionModel>, Option<EvaluationMetrics>) {
        let cfg = &self.config.transition;
        let (train, test) = train_test_split(visits, cfg.train_fraction);

        if train.len() < 2 {
            log::warn!(
                "[{}] {}",
                user_id,
                PipelineError::InsufficientData {
                    stage: "transition model",
                    needed: 2,
                    found: train.len()
                }
            );
            return (None, None);
        }

        let model = TransitionModel::fit_visits(train, cfg.max_transition_gap.map(to_time_delta));
        let held_out: Vec<LocationId> = test.iter().map(|v| v.location_id).collect();
        let metrics = evaluate(&model, &held_out, cfg.top_k);

        (Some(model), Some(metrics))
    }
}
