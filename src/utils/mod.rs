mod maths_utils;
mod perf;
mod time_utils;

pub use time_utils::{
    TimeUtils, format_duration, format_timestamp, fractional_days, fractional_hours,
    to_time_delta,
};

pub use maths_utils::{clamp_unit, harmonic_mean, mean, min_max};
