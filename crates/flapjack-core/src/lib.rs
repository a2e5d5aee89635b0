//! # Flapjack Core Library
//!
//! Business logic for the Flapjack 24-hour challenge tracker. A single
//! shared challenge record counts down from 24 hours; logged pancakes,
//! bacon, sausage and leaguemate pancakes knock time off the clock.
//!
//! ## Architecture
//!
//! - **Countdown Engine**: a pure function of the challenge record and the
//!   current instant. No clock, no cache; callers recompute on every tick
//!   and on every store push.
//! - **Store**: the single record, with subscribe / merge / replace. SQLite
//!   for sharing between processes, in-memory for tests.
//! - **Commands**: start, reset and per-item increments issued by admins.
//!
//! ## Key Components
//!
//! - [`compute_status`]: remaining time, percent and fuzzy estimate
//! - [`ChallengeStore`]: backing store contract
//! - [`DisplayContext`]: explicit view state between frames
//! - [`Config`]: application configuration management

pub mod admin;
pub mod challenge;
pub mod commands;
pub mod countdown;
pub mod error;
pub mod events;
pub mod storage;
pub mod store;
pub mod view;

pub use admin::AdminList;
pub use challenge::{ChallengePatch, ChallengeState, FoodItem, TimePatch, CHALLENGE_KEY};
pub use commands::CommandKind;
pub use countdown::{
    compute_calories, compute_status, compute_total_reduction_minutes, format_reduction_minutes,
    Phase, ReductionBreakdown, Status,
};
pub use error::{CommandError, ConfigError, CoreError, StoreError, UnknownFoodItem};
pub use events::Event;
pub use storage::{Config, Database};
pub use store::{ChallengeStore, Clock, MemoryStore, SqliteStore, Subscription, SystemClock};
pub use view::{DisplayContext, Frame};
