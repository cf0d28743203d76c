mod batch;
mod pipeline;
mod screen;

pub use {
    batch::{BatchOutcome, batch_errors, run_batch},
    pipeline::{Pipeline, UserReport},
    screen::{ScreenCount, ScreenedUser, screen_users},
};
