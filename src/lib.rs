#![allow(clippy::collapsible_if)]
#![allow(clippy::type_complexity)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod models;
pub mod utils;

// Re-export commonly used types outside of crate (for the binaries)
pub use config::PipelineConfig;
pub use domain::{GeoPoint, Location, LocationId, RawFix, StayPoint};
pub use engine::{Pipeline, UserReport, run_batch};
pub use error::{PipelineError, PipelineResult};
pub use models::{EvaluationMetrics, EvaluationRecord, LoyaltyLabel, Profile, TransitionModel};

// CLI argument parsing
use {
    clap::{Parser, ValueEnum},
    config::{Meters, constants},
    std::{path::PathBuf, time::Duration},
};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// A GeoLife user's `Trajectory` folder of `.plt` files
    Geolife,
    /// A `timestamp,lat,lon` CSV file
    Csv,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Significant places and movement habits from GPS fixes", long_about = None)]
pub struct Cli {
    /// Fix source (folder for geolife, file for csv)
    pub input: PathBuf,

    #[arg(long, value_enum, default_value = "geolife")]
    pub format: InputFormat,

    /// Label used in logs and reports (defaults to the input's folder or file name)
    #[arg(long)]
    pub user_id: Option<String>,

    /// JSON pipeline config; individual flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// UTC offset applied to GeoLife timestamps
    #[arg(long, default_value_t = 8)]
    pub utc_offset_hours: i32,

    #[arg(long)]
    pub distance_m: Option<f64>,

    #[arg(long)]
    pub time_min: Option<u64>,

    #[arg(long)]
    pub epsilon_m: Option<f64>,

    #[arg(long)]
    pub min_points: Option<usize>,

    /// Weight DBSCAN density by fix count
    #[arg(long, default_value_t = false)]
    pub weighted: bool,

    #[arg(long)]
    pub train_fraction: Option<f64>,

    #[arg(long)]
    pub top_k: Option<usize>,

    #[arg(long)]
    pub min_state_visits: Option<usize>,

    /// Ignore transitions idle longer than this many hours (24 when given without a value)
    #[arg(long, num_args = 0..=1)]
    pub transition_gap_hours: Option<Option<f64>>,

    /// Write the full report as JSON
    #[arg(long)]
    pub json_out: Option<PathBuf>,
}

impl Cli {
    /// Applies command-line overrides on top of `base`. Validation is left to the caller.
    pub fn apply_overrides(&self, base: PipelineConfig) -> PipelineConfig {
        let mut config = base;

        if let Some(d) = self.distance_m {
            config.detector.distance_threshold = Meters::new(d);
        }
        if let Some(m) = self.time_min {
            config.detector.time_threshold = Duration::from_secs(m * 60);
        }
        if let Some(e) = self.epsilon_m {
            config.clusterer.epsilon = Meters::new(e);
        }
        if let Some(p) = self.min_points {
            config.clusterer.min_points = p;
        }
        if self.weighted {
            config.clusterer.weight_by_fix_count = true;
        }
        if let Some(f) = self.train_fraction {
            config.transition.train_fraction = f;
        }
        if let Some(k) = self.top_k {
            config.transition.top_k = k;
        }
        if let Some(v) = self.min_state_visits {
            config.transition.min_state_visits = v;
        }
        if let Some(gap) = self.transition_gap_hours {
            config.transition.max_transition_gap = Some(match gap {
                Some(h) if h > 0.0 && h.is_finite() => Duration::from_secs_f64(h * 3600.0),
                Some(_) => Duration::ZERO,
                None => constants::DEFAULT_TRANSITION_GAP,
            });
        }
        config
    }
}

/// Logger setup shared by the binaries. Quiet for dependencies, louder for this crate.
/// `RUST_LOG` still wins when set.
pub fn init_logging() {
    let (global_level, my_code_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    } else {
        (log::LevelFilter::Error, log::LevelFilter::Error)
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter(None, global_level)
        .filter(Some(env!("CARGO_CRATE_NAME")), my_code_level)
        .parse_default_env();
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_touch_only_given_fields() {
        let cli = Cli::parse_from(["haunts", "data/000", "--epsilon-m", "150", "--top-k", "5"]);
        let config = cli.apply_overrides(PipelineConfig::DEFAULT);

        assert_eq!(config.clusterer.epsilon, Meters::new(150.0));
        assert_eq!(config.transition.top_k, 5);
        assert_eq!(config.detector, PipelineConfig::DEFAULT.detector);
        assert_eq!(cli.format, InputFormat::Geolife);
    }

    #[test]
    fn bare_gap_flag_uses_default_gap() {
        let cli = Cli::parse_from(["haunts", "x.csv", "--format", "csv", "--transition-gap-hours"]);
        let config = cli.apply_overrides(PipelineConfig::DEFAULT);
        assert_eq!(
            config.transition.max_transition_gap,
            Some(constants::DEFAULT_TRANSITION_GAP)
        );

        let cli = Cli::parse_from(["haunts", "x.csv", "--transition-gap-hours", "6"]);
        let config = cli.apply_overrides(PipelineConfig::DEFAULT);
        assert_eq!(
            config.transition.max_transition_gap,
            Some(Duration::from_secs(6 * 3600))
        );
    }

    #[test]
    fn nonsense_override_fails_validation() {
        let cli = Cli::parse_from(["haunts", "x", "--transition-gap-hours", "0"]);
        assert!(cli.apply_overrides(PipelineConfig::DEFAULT).validate().is_err());
    }
}
