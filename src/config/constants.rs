use std::time::Duration;

// Top Level Constants
/// Mean earth radius (IUGG) used by every great-circle computation.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Activate the trace_time macro (scope-level timing of pipeline stages).
pub const LOG_PERFORMANCE: bool = false;

pub mod detector {
    use crate::config::{DetectorConfig, Meters};
    use std::time::Duration;

    pub const DISTANCE_THRESHOLD: Meters = Meters::new(200.0);
    pub const TIME_THRESHOLD: Duration = Duration::from_secs(30 * 60);

    pub const DEFAULT: DetectorConfig = DetectorConfig {
        distance_threshold: DISTANCE_THRESHOLD,
        time_threshold: TIME_THRESHOLD,
        // Off by default: windows only close on a spatial exceedance.
        max_fix_gap: None,
    };
}

pub mod clusterer {
    use crate::config::{ClustererConfig, Meters};

    pub const EPSILON: Meters = Meters::new(200.0);
    pub const MIN_POINTS: usize = 2;

    pub const DEFAULT: ClustererConfig = ClustererConfig {
        epsilon: EPSILON,
        min_points: MIN_POINTS,
        weight_by_fix_count: false,
    };
}

pub mod profiler {
    use crate::config::{
        AnchorConfig, Coverage, LabelRule, LabelThresholds, ProfilerConfig, SleepConfig,
        TimeWindow, WorkConfig,
    };

    pub const RECENCY_HALF_LIFE_DAYS: f64 = 30.0;
    pub const DWELL_HALF_SATURATION_HOURS: f64 = 4.0;
    pub const VISIT_HALF_SATURATION: f64 = 10.0;

    /// Below this many visits nothing stronger than Transient is assigned.
    pub const MIN_VISITS_FOR_LABEL: usize = 2;

    pub const LABELS: LabelThresholds = LabelThresholds {
        anchor: LabelRule {
            min_loyalty: 0.50,
            min_regularity: 0.10,
        },
        habit: LabelRule {
            min_loyalty: 0.25,
            min_regularity: 0.0,
        },
        recurring: LabelRule {
            min_loyalty: 0.05,
            min_regularity: 0.0,
        },
    };

    pub const SLEEP: SleepConfig = SleepConfig {
        window: TimeWindow {
            start_hour: 22,
            end_hour: 5,
        },
        min_hours: 4.0,
        coverage: Coverage::Sparse,
    };

    pub const WORK: WorkConfig = WorkConfig {
        window: TimeWindow {
            start_hour: 9,
            end_hour: 18,
        },
        min_hours: 4.0,
        // Monday..Friday
        work_days: [true, true, true, true, true, false, false],
        coverage: Coverage::Sparse,
    };

    pub const DEFAULT: ProfilerConfig = ProfilerConfig {
        recency_half_life_days: RECENCY_HALF_LIFE_DAYS,
        dwell_half_saturation_hours: DWELL_HALF_SATURATION_HOURS,
        visit_half_saturation: VISIT_HALF_SATURATION,
        labels: LABELS,
        anchors: AnchorConfig {
            sleep: SLEEP,
            work: WORK,
            exclude_home_from_work: false,
        },
    };
}

pub mod transition {
    use crate::config::TransitionConfig;

    pub const TRAIN_FRACTION: f64 = 0.8;
    pub const TOP_K: usize = 3;
    /// Locations visited fewer times than this share one catch-all state.
    pub const MIN_STATE_VISITS: usize = 2;

    pub const DEFAULT: TransitionConfig = TransitionConfig {
        train_fraction: TRAIN_FRACTION,
        top_k: TOP_K,
        max_transition_gap: None,
        min_state_visits: MIN_STATE_VISITS,
    };
}

/// Minimum stay points a user needs before the screening binary keeps them.
pub const SCREEN_MIN_STAY_POINTS: usize = 150;

/// Fallback idle gap when a caller opts into transition gap filtering without a value.
pub const DEFAULT_TRANSITION_GAP: Duration = Duration::from_secs(24 * 60 * 60);
