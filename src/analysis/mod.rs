// Pipeline stages and the scoring behind them
pub mod anchor_points;
pub mod decay;
pub mod location_profiler;
pub mod predictability;
pub mod staypoint_clusterer;
pub mod staypoint_detector;
pub mod transition_evaluator;

pub use {
    anchor_points::{AnchorCandidate, AnchorPoints, find_anchors},
    location_profiler::{LocationProfiler, classify},
    predictability::{PredictabilityScores, predictability},
    staypoint_clusterer::{StayPointClusterer, davies_bouldin_index},
    staypoint_detector::{StayPointDetector, StayPoints},
    transition_evaluator::{collapse_rare_states, evaluate, train_test_split},
};
