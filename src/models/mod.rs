mod evaluation;
mod profile;
mod transition_model;

pub use {
    evaluation::{Accuracy, EvaluationMetrics, EvaluationRecord, StateAccuracy, improvement_pct},
    profile::{LoyaltyFactors, LoyaltyLabel, Profile, likely_home},
    transition_model::{TransitionModel, VisitEvent},
};
