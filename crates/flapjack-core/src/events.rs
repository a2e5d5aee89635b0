use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::challenge::{ChallengeState, FoodItem};
use crate::countdown::{compute_status, Phase};

/// Every mutation of the challenge produces an Event.
/// The CLI prints them as JSON; watchers log them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ChallengeStarted {
        start_time: DateTime<Utc>,
        /// Counters carried over from before the start.
        carried_over: bool,
        at: DateTime<Utc>,
    },
    ItemLogged {
        item: FoodItem,
        count: u32,
        /// Minutes this single item took off the clock. Zero for the
        /// first strip or link of a pair.
        reduction_minutes: u64,
        at: DateTime<Utc>,
    },
    ChallengeReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: Option<ChallengeState>,
        phase: Phase,
        countdown_text: String,
        percent_complete: f64,
        text: String,
        calories: u64,
        total_reduction_minutes: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Snapshot of everything the views show for `state` at `now`.
    pub fn snapshot(state: Option<&ChallengeState>, now: DateTime<Utc>) -> Self {
        let status = compute_status(state, now);
        let (calories, total_reduction_minutes) = state
            .map(|s| {
                (
                    crate::countdown::compute_calories(s),
                    crate::countdown::compute_total_reduction_minutes(s),
                )
            })
            .unwrap_or((0, 0));
        Event::StateSnapshot {
            state: state.cloned(),
            phase: status.phase,
            countdown_text: status.countdown_text,
            percent_complete: status.percent_complete,
            text: status.text,
            calories,
            total_reduction_minutes,
            at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::ItemLogged {
            item: FoodItem::BaconStrip,
            count: 2,
            reduction_minutes: 15,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "item_logged");
        assert_eq!(json["item"], "bacon_strip");
        assert_eq!(json["reduction_minutes"], 15);
    }

    #[test]
    fn snapshot_of_absent_state() {
        let json = serde_json::to_value(Event::snapshot(None, Utc::now())).unwrap();
        assert_eq!(json["type"], "state_snapshot");
        assert_eq!(json["phase"], "not_started");
        assert_eq!(json["countdown_text"], "24:00:00");
        assert!(json["state"].is_null());
        assert_eq!(json["calories"], 0);
    }
}
