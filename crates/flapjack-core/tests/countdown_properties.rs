//! Property tests for the countdown engine.

use chrono::{DateTime, Duration, TimeZone, Utc};
use flapjack_core::countdown::{compute_status, food_reduction_secs, CHALLENGE_DURATION_SECS};
use flapjack_core::{ChallengeState, Phase};
use proptest::prelude::*;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
}

prop_compose! {
    fn arb_state()(
        pancakes in 0u32..40,
        bacon_strips in 0u32..80,
        sausage_links in 0u32..80,
        helper_pancakes in 0u32..60,
        is_active in any::<bool>(),
        started in any::<bool>(),
    ) -> ChallengeState {
        ChallengeState {
            start_time: started.then(start),
            pancakes,
            bacon_strips,
            sausage_links,
            helper_pancakes,
            is_active,
        }
    }
}

proptest! {
    #[test]
    fn remaining_stays_within_bounds(
        state in arb_state(),
        offset_secs in -7_200i64..200_000,
    ) {
        let status = compute_status(Some(&state), start() + Duration::seconds(offset_secs));
        prop_assert!(status.remaining_secs >= 0);
        prop_assert!(status.remaining_secs <= CHALLENGE_DURATION_SECS);
        prop_assert!((0.0..=100.0).contains(&status.percent_complete));
        prop_assert_eq!(status.countdown_text.len(), 8);
    }

    #[test]
    fn not_running_is_always_not_started(
        state in arb_state(),
        offset_secs in 0i64..200_000,
    ) {
        prop_assume!(!state.is_running());
        let status = compute_status(Some(&state), start() + Duration::seconds(offset_secs));
        prop_assert_eq!(status.phase, Phase::NotStarted);
        prop_assert_eq!(status.countdown_text, "24:00:00");
        prop_assert_eq!(status.percent_complete, 0.0);
        prop_assert_eq!(status.text, "Challenge not started");
    }

    #[test]
    fn exhausted_budget_is_complete(
        state in arb_state(),
        offset_secs in 0i64..200_000,
    ) {
        prop_assume!(state.is_running());
        let status = compute_status(Some(&state), start() + Duration::seconds(offset_secs));
        let spent = food_reduction_secs(&state) + offset_secs;
        if spent >= CHALLENGE_DURATION_SECS {
            prop_assert_eq!(status.phase, Phase::Complete);
            prop_assert_eq!(status.percent_complete, 100.0);
            prop_assert_eq!(status.countdown_text, "00:00:00");
        } else {
            prop_assert_eq!(status.phase, Phase::Running);
            prop_assert_eq!(status.remaining_secs, CHALLENGE_DURATION_SECS - spent);
        }
    }

    #[test]
    fn more_food_never_adds_time(
        state in arb_state(),
        offset_secs in 0i64..100_000,
    ) {
        let now = start() + Duration::seconds(offset_secs);
        let before = compute_status(Some(&state), now);
        let fed = ChallengeState { pancakes: state.pancakes + 1, ..state.clone() };
        let after = compute_status(Some(&fed), now);
        prop_assert!(after.remaining_secs <= before.remaining_secs);
    }

    #[test]
    fn pure_for_identical_inputs(
        state in arb_state(),
        offset_secs in -100i64..100_000,
    ) {
        let now = start() + Duration::seconds(offset_secs);
        prop_assert_eq!(compute_status(Some(&state), now), compute_status(Some(&state), now));
    }
}
