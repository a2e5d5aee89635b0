//! Countdown engine.
//!
//! A pure function of the persisted challenge record and the current
//! instant. There is no internal clock and no cached state: callers
//! recompute on every tick and on every store push.
//!
//! ## Reduction rules
//!
//! ```text
//! remaining = 86400 - (food reduction + elapsed wall-clock seconds)
//!
//! pancake            -3600 s each
//! leaguemate pancake -1800 s each
//! bacon strips        -900 s per full pair
//! sausage links       -900 s per full pair
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::format::{format_countdown, format_relative};
use crate::challenge::{ChallengeState, FoodItem};

/// Length of a challenge before any reductions.
pub const CHALLENGE_DURATION_SECS: i64 = 24 * 60 * 60;
pub const PANCAKE_REDUCTION_SECS: i64 = 60 * 60;
pub const HELPER_PANCAKE_REDUCTION_SECS: i64 = 30 * 60;
/// Credit for each complete pair of bacon strips or sausage links.
pub const PAIR_REDUCTION_SECS: i64 = 15 * 60;

pub const PANCAKE_CALORIES: f64 = 240.0;
pub const BACON_STRIP_CALORIES: f64 = 52.5;
pub const SAUSAGE_LINK_CALORIES: f64 = 80.0;

const NOT_STARTED_TEXT: &str = "Challenge not started";
const COMPLETE_TEXT: &str = "Challenge Complete!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    Running,
    Complete,
}

/// Everything the views derive from one challenge snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub phase: Phase,
    pub remaining_secs: i64,
    /// Whole minutes left, rounded down. Zero once less than a minute remains.
    pub remaining_minutes: i64,
    /// 0.0 ..= 100.0
    pub percent_complete: f64,
    /// `HH:MM:SS`
    pub countdown_text: String,
    /// Human readable estimate, e.g. "in about 19 hours".
    pub text: String,
}

impl Status {
    fn not_started() -> Self {
        Self {
            phase: Phase::NotStarted,
            remaining_secs: CHALLENGE_DURATION_SECS,
            remaining_minutes: 0,
            percent_complete: 0.0,
            countdown_text: format_countdown(CHALLENGE_DURATION_SECS),
            text: NOT_STARTED_TEXT.to_string(),
        }
    }

    fn complete() -> Self {
        Self {
            phase: Phase::Complete,
            remaining_secs: 0,
            remaining_minutes: 0,
            percent_complete: 100.0,
            countdown_text: format_countdown(0),
            text: COMPLETE_TEXT.to_string(),
        }
    }
}

/// Derive the display status of `state` at `now`.
///
/// An absent, inactive or unstarted record yields the "not started"
/// status; this function has no failure mode.
pub fn compute_status(state: Option<&ChallengeState>, now: DateTime<Utc>) -> Status {
    let Some((state, start_time)) =
        state.and_then(|s| s.start_time.filter(|_| s.is_active).map(|t| (s, t)))
    else {
        return Status::not_started();
    };

    // Truncates toward zero. Negative when the store clock runs ahead of ours.
    let elapsed_secs = (now - start_time).num_seconds();
    let total_reduction = food_reduction_secs(state) + elapsed_secs;
    let remaining_secs = (CHALLENGE_DURATION_SECS - total_reduction).clamp(0, CHALLENGE_DURATION_SECS);

    if remaining_secs <= 0 {
        return Status::complete();
    }

    let percent_complete = (CHALLENGE_DURATION_SECS - remaining_secs) as f64
        / CHALLENGE_DURATION_SECS as f64
        * 100.0;
    let remaining_minutes = remaining_secs / 60;
    let end_time = now + Duration::minutes(remaining_minutes);

    Status {
        phase: Phase::Running,
        remaining_secs,
        remaining_minutes,
        percent_complete,
        countdown_text: format_countdown(remaining_secs),
        text: format_relative(end_time, now),
    }
}

/// Seconds removed from the countdown by logged food.
pub fn food_reduction_secs(state: &ChallengeState) -> i64 {
    i64::from(state.pancakes) * PANCAKE_REDUCTION_SECS
        + i64::from(state.bacon_strips / 2) * PAIR_REDUCTION_SECS
        + i64::from(state.sausage_links / 2) * PAIR_REDUCTION_SECS
        + i64::from(state.helper_pancakes) * HELPER_PANCAKE_REDUCTION_SECS
}

/// Minutes removed by logged food, ignoring elapsed time.
pub fn compute_total_reduction_minutes(state: &ChallengeState) -> u64 {
    ReductionBreakdown::of(state).total_minutes()
}

/// Calories consumed by the challenger. Leaguemate pancakes don't count.
pub fn compute_calories(state: &ChallengeState) -> u64 {
    let calories = f64::from(state.pancakes) * PANCAKE_CALORIES
        + f64::from(state.bacon_strips) * BACON_STRIP_CALORIES
        + f64::from(state.sausage_links) * SAUSAGE_LINK_CALORIES;
    calories.round() as u64
}

/// Per-item reduction in minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReductionBreakdown {
    pub pancake_minutes: u64,
    pub bacon_minutes: u64,
    pub sausage_minutes: u64,
    pub helper_minutes: u64,
}

impl ReductionBreakdown {
    pub fn of(state: &ChallengeState) -> Self {
        let minutes = |secs: i64| (secs / 60) as u64;
        Self {
            pancake_minutes: u64::from(state.pancakes) * minutes(PANCAKE_REDUCTION_SECS),
            bacon_minutes: u64::from(state.bacon_strips / 2) * minutes(PAIR_REDUCTION_SECS),
            sausage_minutes: u64::from(state.sausage_links / 2) * minutes(PAIR_REDUCTION_SECS),
            helper_minutes: u64::from(state.helper_pancakes)
                * minutes(HELPER_PANCAKE_REDUCTION_SECS),
        }
    }

    pub fn minutes_for(&self, item: FoodItem) -> u64 {
        match item {
            FoodItem::Pancake => self.pancake_minutes,
            FoodItem::BaconStrip => self.bacon_minutes,
            FoodItem::SausageLink => self.sausage_minutes,
            FoodItem::HelperPancake => self.helper_minutes,
        }
    }

    pub fn total_minutes(&self) -> u64 {
        self.pancake_minutes + self.bacon_minutes + self.sausage_minutes + self.helper_minutes
    }
}
