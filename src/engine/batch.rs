//! Many users, one independent pipeline run each.

use {
    crate::{
        config::PipelineConfig,
        domain::RawFix,
        engine::{Pipeline, UserReport},
        error::{PipelineError, PipelineResult},
    },
    rayon::prelude::*,
    std::time::Instant,
};

/// Result of one user's run. A failure here never affects the other users.
#[derive(Debug)]
pub struct BatchOutcome {
    pub user_id: String,
    pub result: PipelineResult<UserReport>,
    pub elapsed_ms: u128,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs every user in parallel. Configuration errors fail the whole batch up front;
/// data errors are confined to the offending user's outcome. Output keeps input order.
pub fn run_batch(
    config: PipelineConfig,
    users: Vec<(String, Vec<RawFix>)>,
) -> PipelineResult<Vec<BatchOutcome>> {
    let pipeline = Pipeline::new(config)?;
    log::info!("Starting batch of {} users.", users.len());

    let outcomes: Vec<BatchOutcome> = users
        .into_par_iter()
        .map(|(user_id, fixes)| {
            let start = Instant::now();
            let result = pipeline.run(&user_id, &fixes);
            if let Err(e) = &result {
                log::error!("[{}] Pipeline failed: {}", user_id, e);
            }
            BatchOutcome {
                user_id,
                result,
                elapsed_ms: start.elapsed().as_millis(),
            }
        })
        .collect();

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    log::info!(
        "Batch complete: {} succeeded, {} failed.",
        outcomes.len() - failed,
        failed
    );
    Ok(outcomes)
}

/// Errors of a finished batch, by user.
pub fn batch_errors(outcomes: &[BatchOutcome]) -> Vec<(&str, &PipelineError)> {
    outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().err().map(|e| (o.user_id.as_str(), e)))
        .collect()
}
