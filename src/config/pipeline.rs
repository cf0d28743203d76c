//! Pipeline configuration.
//!
//! One `PipelineConfig` is built per run and handed to each stage's constructor.
//! Every constructor calls the matching `validate()` so a bad value is rejected
//! before any fix is processed.

use {
    crate::{
        config::{Coverage, Meters, constants},
        error::{PipelineResult, config_err},
    },
    anyhow::{Context, Result},
    serde::{Deserialize, Serialize},
    std::{path::Path, time::Duration},
};

/// Stay-point detection thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Maximum distance from the window anchor for a fix to count as "still there".
    pub distance_threshold: Meters,
    /// Minimum elapsed time between first and last fix of an emitted stay.
    pub time_threshold: Duration,
    /// Close the window when two consecutive fixes are further apart than this.
    #[serde(default)]
    pub max_fix_gap: Option<Duration>,
}

impl DetectorConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        if !self.distance_threshold.is_positive() {
            return Err(config_err(format!(
                "distance_threshold must be positive, got {}",
                self.distance_threshold.value()
            )));
        }
        if self.time_threshold.is_zero() {
            return Err(config_err("time_threshold must be positive"));
        }
        if self.max_fix_gap.is_some_and(|g| g.is_zero()) {
            return Err(config_err("max_fix_gap must be positive when set"));
        }
        Ok(())
    }
}

/// Density clustering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClustererConfig {
    /// Neighbourhood radius.
    pub epsilon: Meters,
    /// Minimum neighbourhood density (self included) for a core point.
    pub min_points: usize,
    /// Count each stay point as `fix_count` units of density instead of 1.
    #[serde(default)]
    pub weight_by_fix_count: bool,
}

impl ClustererConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        if !self.epsilon.is_positive() {
            return Err(config_err(format!(
                "epsilon must be positive, got {}",
                self.epsilon.value()
            )));
        }
        if self.min_points == 0 {
            return Err(config_err("min_points must be at least 1"));
        }
        Ok(())
    }
}

/// Minimum loyalty and regularity (composite predictability) for one label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelRule {
    pub min_loyalty: f64,
    pub min_regularity: f64,
}

impl LabelRule {
    pub fn admits(&self, loyalty: f64, regularity: f64) -> bool {
        loyalty >= self.min_loyalty && regularity >= self.min_regularity
    }
}

/// Classification cutoffs. Anything that fails all three rules is Transient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelThresholds {
    pub anchor: LabelRule,
    pub habit: LabelRule,
    pub recurring: LabelRule,
}

impl LabelThresholds {
    /// Loyalty floor below which a location is always Transient.
    pub fn transient_floor(&self) -> f64 {
        self.recurring.min_loyalty
    }

    pub fn validate(&self) -> PipelineResult<()> {
        for (name, rule) in [
            ("anchor", self.anchor),
            ("habit", self.habit),
            ("recurring", self.recurring),
        ] {
            let in_unit = |v: f64| (0.0..=1.0).contains(&v);
            if !in_unit(rule.min_loyalty) || !in_unit(rule.min_regularity) {
                return Err(config_err(format!(
                    "{name} thresholds must lie in [0, 1], got loyalty {} / regularity {}",
                    rule.min_loyalty, rule.min_regularity
                )));
            }
        }
        if self.anchor.min_loyalty < self.habit.min_loyalty
            || self.habit.min_loyalty < self.recurring.min_loyalty
        {
            return Err(config_err(
                "label loyalty thresholds must satisfy anchor >= habit >= recurring",
            ));
        }
        Ok(())
    }
}

/// Hour-of-day window. `start_hour > end_hour` means the window wraps midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl TimeWindow {
    pub fn wraps_midnight(&self) -> bool {
        self.start_hour > self.end_hour
    }

    fn validate(&self, name: &str) -> PipelineResult<()> {
        if self.start_hour > 23 || self.end_hour > 23 {
            return Err(config_err(format!(
                "{name} window hours must be in 0..=23, got {}..{}",
                self.start_hour, self.end_hour
            )));
        }
        if self.start_hour == self.end_hour {
            return Err(config_err(format!("{name} window must not be empty")));
        }
        Ok(())
    }
}

/// Bed-down (home) candidacy settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepConfig {
    pub window: TimeWindow,
    pub min_hours: f64,
    pub coverage: Coverage,
}

/// Work candidacy settings. `work_days` is indexed Monday = 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkConfig {
    pub window: TimeWindow,
    pub min_hours: f64,
    pub work_days: [bool; 7],
    pub coverage: Coverage,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorConfig {
    pub sleep: SleepConfig,
    pub work: WorkConfig,
    /// Drop home candidates from the work search.
    #[serde(default)]
    pub exclude_home_from_work: bool,
}

impl AnchorConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        self.sleep.window.validate("sleep")?;
        self.work.window.validate("work")?;
        if self.work.window.wraps_midnight() {
            return Err(config_err("work window must not wrap midnight"));
        }
        if !(self.sleep.min_hours > 0.0) || !(self.work.min_hours > 0.0) {
            return Err(config_err("anchor min_hours must be positive"));
        }
        if !self.work.work_days.iter().any(|&d| d) {
            return Err(config_err("at least one work day is required"));
        }
        Ok(())
    }
}

/// Loyalty decay constants, label cutoffs and anchor settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilerConfig {
    /// Days since last visit at which recency halves.
    pub recency_half_life_days: f64,
    /// Cumulative dwell hours at which duration saturation reaches 0.5.
    pub dwell_half_saturation_hours: f64,
    /// Visit count at which visit saturation reaches 0.5.
    pub visit_half_saturation: f64,
    pub labels: LabelThresholds,
    pub anchors: AnchorConfig,
}

impl ProfilerConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        for (name, v) in [
            ("recency_half_life_days", self.recency_half_life_days),
            ("dwell_half_saturation_hours", self.dwell_half_saturation_hours),
            ("visit_half_saturation", self.visit_half_saturation),
        ] {
            if !(v > 0.0 && v.is_finite()) {
                return Err(config_err(format!("{name} must be positive, got {v}")));
            }
        }
        self.labels.validate()?;
        self.anchors.validate()
    }
}

/// Train/test split and evaluation settings for the transition model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// Share of the visit sequence used for fitting, taken from the front.
    pub train_fraction: f64,
    /// k for top-k accuracy.
    pub top_k: usize,
    /// Skip transitions whose idle time exceeds this.
    #[serde(default)]
    pub max_transition_gap: Option<Duration>,
    /// Locations with fewer visits are folded into `LocationId::OTHER`. 0 or 1 disables.
    pub min_state_visits: usize,
}

impl TransitionConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(config_err(format!(
                "train_fraction must lie strictly between 0 and 1, got {}",
                self.train_fraction
            )));
        }
        if self.top_k == 0 {
            return Err(config_err("top_k must be at least 1"));
        }
        if self.max_transition_gap.is_some_and(|g| g.is_zero()) {
            return Err(config_err("max_transition_gap must be positive when set"));
        }
        Ok(())
    }
}

/// The Master Pipeline Configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub detector: DetectorConfig,
    pub clusterer: ClustererConfig,
    pub profiler: ProfilerConfig,
    pub transition: TransitionConfig,
}

impl PipelineConfig {
    pub const DEFAULT: Self = Self {
        detector: constants::detector::DEFAULT,
        clusterer: constants::clusterer::DEFAULT,
        profiler: constants::profiler::DEFAULT,
        transition: constants::transition::DEFAULT,
    };

    pub fn validate(&self) -> PipelineResult<()> {
        self.detector.validate()?;
        self.clusterer.validate()?;
        self.profiler.validate()?;
        self.transition.validate()
    }

    /// Loads and validates a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
