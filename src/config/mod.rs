//! Configuration module for the haunts pipeline.

// Can all be private now because we have a public re-export.
mod pipeline;
mod types;

// Public
pub mod constants;

// Re-export commonly used items
pub use constants::{EARTH_RADIUS_M, LOG_PERFORMANCE};
pub use pipeline::{
    AnchorConfig, ClustererConfig, DetectorConfig, LabelRule, LabelThresholds, PipelineConfig,
    ProfilerConfig, SleepConfig, TimeWindow, TransitionConfig, WorkConfig,
};
pub use types::{Coverage, Meters, Prob};
