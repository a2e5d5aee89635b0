mod engine;
mod format;

pub use engine::{
    compute_calories, compute_status, compute_total_reduction_minutes, food_reduction_secs, Phase,
    ReductionBreakdown, Status, BACON_STRIP_CALORIES, CHALLENGE_DURATION_SECS,
    HELPER_PANCAKE_REDUCTION_SECS, PANCAKE_CALORIES, PANCAKE_REDUCTION_SECS, PAIR_REDUCTION_SECS,
    SAUSAGE_LINK_CALORIES,
};
pub use format::{
    format_clock, format_countdown, format_distance, format_relative, format_reduction_minutes,
};
