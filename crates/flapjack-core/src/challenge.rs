//! The persisted challenge record and the field-level patches applied to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownFoodItem;

/// Fixed key of the single challenge record.
pub const CHALLENGE_KEY: &str = "challenge/current";

/// The one and only challenge document.
///
/// Field names are camelCase on the wire. Missing fields fall back to
/// their defaults so a partially written record still decodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengeState {
    pub start_time: Option<DateTime<Utc>>,
    pub pancakes: u32,
    pub bacon_strips: u32,
    pub sausage_links: u32,
    pub helper_pancakes: u32,
    pub is_active: bool,
}

impl ChallengeState {
    /// Counter value for a food item.
    pub fn count(&self, item: FoodItem) -> u32 {
        match item {
            FoodItem::Pancake => self.pancakes,
            FoodItem::BaconStrip => self.bacon_strips,
            FoodItem::SausageLink => self.sausage_links,
            FoodItem::HelperPancake => self.helper_pancakes,
        }
    }

    /// The countdown is running: active with a start time.
    pub fn is_running(&self) -> bool {
        self.is_active && self.start_time.is_some()
    }

    /// Apply a merge patch in place. `server_now` resolves
    /// [`TimePatch::ServerNow`].
    pub fn apply(&mut self, patch: &ChallengePatch, server_now: DateTime<Utc>) {
        if let Some(time) = patch.start_time {
            self.start_time = match time {
                TimePatch::ServerNow => Some(server_now),
                TimePatch::Clear => None,
            };
        }
        if let Some(n) = patch.pancakes {
            self.pancakes = n;
        }
        if let Some(n) = patch.bacon_strips {
            self.bacon_strips = n;
        }
        if let Some(n) = patch.sausage_links {
            self.sausage_links = n;
        }
        if let Some(n) = patch.helper_pancakes {
            self.helper_pancakes = n;
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
    }
}

/// Loggable food items. Each maps onto one counter of [`ChallengeState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodItem {
    Pancake,
    BaconStrip,
    SausageLink,
    /// Pancake eaten by a leaguemate on the challenger's behalf.
    HelperPancake,
}

impl FoodItem {
    pub const ALL: [FoodItem; 4] = [
        FoodItem::Pancake,
        FoodItem::BaconStrip,
        FoodItem::SausageLink,
        FoodItem::HelperPancake,
    ];

    /// Button label in the admin view.
    pub fn action_label(self) -> &'static str {
        match self {
            FoodItem::Pancake => "Add Pancake (-1 hour)",
            FoodItem::BaconStrip => "Add Bacon (-15 min per 2)",
            FoodItem::SausageLink => "Add Sausage (-15 min per 2)",
            FoodItem::HelperPancake => "Add Leaguemate Pancake (-30 min)",
        }
    }

    /// Patch that sets this item's counter to `value`.
    pub fn patch(self, value: u32) -> ChallengePatch {
        let mut patch = ChallengePatch::default();
        match self {
            FoodItem::Pancake => patch.pancakes = Some(value),
            FoodItem::BaconStrip => patch.bacon_strips = Some(value),
            FoodItem::SausageLink => patch.sausage_links = Some(value),
            FoodItem::HelperPancake => patch.helper_pancakes = Some(value),
        }
        patch
    }
}

impl fmt::Display for FoodItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FoodItem::Pancake => "pancake",
            FoodItem::BaconStrip => "bacon strip",
            FoodItem::SausageLink => "sausage link",
            FoodItem::HelperPancake => "leaguemate pancake",
        };
        f.write_str(name)
    }
}

impl FromStr for FoodItem {
    type Err = UnknownFoodItem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pancake" | "pancakes" | "p" => Ok(FoodItem::Pancake),
            "bacon" | "bacon_strip" | "baconstrip" | "baconstrips" | "b" => {
                Ok(FoodItem::BaconStrip)
            }
            "sausage" | "sausage_link" | "sausagelink" | "sausagelinks" | "s" => {
                Ok(FoodItem::SausageLink)
            }
            "helper" | "helper_pancake" | "helperpancake" | "helperpancakes" | "leaguemate"
            | "h" => Ok(FoodItem::HelperPancake),
            _ => Err(UnknownFoodItem(s.to_string())),
        }
    }
}

/// How a patch touches `startTime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePatch {
    /// Stamp with the store's own clock.
    ServerNow,
    Clear,
}

/// Field-level merge write. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChallengePatch {
    pub start_time: Option<TimePatch>,
    pub pancakes: Option<u32>,
    pub bacon_strips: Option<u32>,
    pub sausage_links: Option<u32>,
    pub helper_pancakes: Option<u32>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn decodes_camel_case_with_missing_fields() {
        let state: ChallengeState =
            serde_json::from_str(r#"{"pancakes": 3, "isActive": true}"#).unwrap();
        assert_eq!(state.pancakes, 3);
        assert_eq!(state.bacon_strips, 0);
        assert!(state.is_active);
        assert!(state.start_time.is_none());
        assert!(!state.is_running());
    }

    #[test]
    fn serializes_null_start_time() {
        let json = serde_json::to_value(ChallengeState::default()).unwrap();
        assert!(json["startTime"].is_null());
        assert_eq!(json["helperPancakes"], 0);
    }

    #[test]
    fn apply_only_touches_named_fields() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let mut state = ChallengeState {
            pancakes: 2,
            bacon_strips: 5,
            ..Default::default()
        };
        state.apply(&FoodItem::SausageLink.patch(1), now);
        assert_eq!(state.pancakes, 2);
        assert_eq!(state.bacon_strips, 5);
        assert_eq!(state.sausage_links, 1);
        assert!(state.start_time.is_none());

        let start = ChallengePatch {
            start_time: Some(TimePatch::ServerNow),
            is_active: Some(true),
            ..Default::default()
        };
        state.apply(&start, now);
        assert_eq!(state.start_time, Some(now));
        assert!(state.is_running());
    }

    #[test]
    fn parses_food_tokens() {
        assert_eq!("Pancakes".parse::<FoodItem>(), Ok(FoodItem::Pancake));
        assert_eq!("bacon".parse::<FoodItem>(), Ok(FoodItem::BaconStrip));
        assert_eq!("leaguemate".parse::<FoodItem>(), Ok(FoodItem::HelperPancake));
        let err = "waffle".parse::<FoodItem>().unwrap_err();
        assert_eq!(err, UnknownFoodItem("waffle".into()));
        assert_eq!(
            err.to_string(),
            "unknown food item 'waffle' (expected pancake, bacon, sausage or helper)"
        );
    }

    #[test]
    fn count_matches_field() {
        let state = ChallengeState {
            pancakes: 1,
            bacon_strips: 2,
            sausage_links: 3,
            helper_pancakes: 4,
            ..Default::default()
        };
        let counts: Vec<u32> = FoodItem::ALL.iter().map(|i| state.count(*i)).collect();
        assert_eq!(counts, vec![1, 2, 3, 4]);
    }
}
