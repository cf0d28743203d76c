use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

/// Every failure the pipeline can surface.
///
/// `InputOrdering` and `Configuration` are fatal for a run. `InsufficientData` and
/// `DegenerateMetric` describe situations the stages recover from themselves by
/// returning a degenerate result (empty list, 0.0, Transient label); they exist so
/// the recovery can be logged and, where a caller asks for strictness, reported.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("fix {index} at {current} precedes the previous fix at {previous}")]
    InputOrdering {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("insufficient data for {stage}: need {needed}, found {found}")]
    InsufficientData {
        stage: &'static str,
        needed: usize,
        found: usize,
    },

    #[error("degenerate metric: {0}")]
    DegenerateMetric(&'static str),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("no fix source found at {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Shorthand used by the config validators.
pub(crate) fn config_err(msg: impl Into<String>) -> PipelineError {
    PipelineError::Configuration(msg.into())
}
