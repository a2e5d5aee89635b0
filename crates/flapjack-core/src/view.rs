//! Text rendering of the public and admin views.
//!
//! Views hold no ambient state. Everything they need lives in an explicit
//! [`DisplayContext`], fed by store pushes and recomputed on every tick
//! through [`DisplayContext::recompute`].

use chrono::{DateTime, Utc};
use std::fmt;

use crate::challenge::{ChallengeState, FoodItem};
use crate::countdown::{
    compute_calories, compute_status, compute_total_reduction_minutes, format_reduction_minutes,
    Phase, ReductionBreakdown, Status,
};
use crate::store::Snapshot;

const TITLE: &str = "Death by Denny's";
const BAR_WIDTH: usize = 40;

/// What the views know between frames.
#[derive(Debug, Clone, Default)]
pub struct DisplayContext {
    state: Option<ChallengeState>,
    last_error: Option<String>,
    celebrating: bool,
}

/// One recomputed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub status: Status,
    /// Active with less than a minute left.
    pub completed: bool,
    /// `completed` flipped from false to true on this frame.
    pub celebration_started: bool,
}

impl DisplayContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a store push. An absent record leaves the last one shown.
    pub fn on_push(&mut self, snapshot: Snapshot) {
        if let Some(state) = snapshot {
            self.state = Some(state);
        }
    }

    /// Remember a failed command. The displayed record stays as it was.
    pub fn on_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn state(&self) -> Option<&ChallengeState> {
        self.state.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.is_active)
    }

    /// Derive the frame for `now`. Both the tick and the store push land here.
    pub fn recompute(&mut self, now: DateTime<Utc>) -> Frame {
        let status = compute_status(self.state.as_ref(), now);
        let completed =
            self.is_active() && status.phase != Phase::NotStarted && status.remaining_minutes <= 0;
        let celebration_started = completed && !self.celebrating;
        self.celebrating = completed;
        Frame {
            status,
            completed,
            celebration_started,
        }
    }
}

/// `[#########...............]  37.5%`
pub fn progress_bar(percent: f64, width: usize) -> String {
    let percent = percent.clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    format!(
        "[{}{}] {:5.1}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        percent
    )
}

fn write_header(f: &mut fmt::Formatter<'_>, clock_line: Option<&str>) -> fmt::Result {
    writeln!(f, "=== {TITLE} ===")?;
    if let Some(clock) = clock_line {
        writeln!(f, "Current Time: {clock}")?;
    }
    Ok(())
}

/// Breakdown column for one item. Pancakes count whole hours.
fn item_reduction_label(item: FoodItem, count: u32, breakdown: &ReductionBreakdown) -> String {
    match item {
        FoodItem::Pancake => format!("-{count} hr"),
        other => format!("-{} min", breakdown.minutes_for(other)),
    }
}

fn write_card(f: &mut fmt::Formatter<'_>, state: &ChallengeState, frame: &Frame) -> fmt::Result {
    if frame.completed {
        writeln!(f)?;
        writeln!(f, "*** PUNISHMENT COMPLETED! ***")?;
        writeln!(
            f,
            "Total items consumed: {} pancakes, {} bacon strips, and {} leaguemate pancakes",
            state.pancakes, state.bacon_strips, state.helper_pancakes
        )?;
    }

    writeln!(f)?;
    if frame.completed {
        writeln!(f, "Punishment Complete!")?;
    } else {
        writeln!(f, "Time Remaining:")?;
    }
    writeln!(f, "  {}", frame.status.countdown_text)?;
    writeln!(f, "  {}", frame.status.text)?;
    writeln!(f, "  {}", progress_bar(frame.status.percent_complete, BAR_WIDTH))?;
    writeln!(f, "  Start{:>width$}", "Punishment Complete", width = BAR_WIDTH)?;

    let breakdown = ReductionBreakdown::of(state);
    writeln!(f)?;
    writeln!(f, "Current Count:")?;
    for item in FoodItem::ALL {
        let label = match item {
            FoodItem::Pancake => "Pancakes eaten",
            FoodItem::BaconStrip => "Bacon strips eaten",
            FoodItem::SausageLink => "Sausage links eaten",
            FoodItem::HelperPancake => "Leaguemate pancakes",
        };
        let count = state.count(item);
        writeln!(
            f,
            "  {:<22}{:>5}   {}",
            format!("{label}:"),
            count,
            item_reduction_label(item, count, &breakdown)
        )?;
    }
    writeln!(f, "  {:<22}{:>5}", "Calories consumed:", compute_calories(state))?;
    writeln!(
        f,
        "  Total time reduction: {}",
        format_reduction_minutes(compute_total_reduction_minutes(state))
    )
}

/// The card while a challenge is active, the status line otherwise.
fn write_body(f: &mut fmt::Formatter<'_>, ctx: &DisplayContext, frame: &Frame) -> fmt::Result {
    match ctx.state().filter(|s| s.is_active) {
        Some(state) => write_card(f, state, frame),
        None => {
            writeln!(f)?;
            writeln!(f, "{}", frame.status.text)
        }
    }
}

/// Public view of one frame.
pub struct PublicView<'a> {
    pub ctx: &'a DisplayContext,
    pub frame: &'a Frame,
    pub clock_line: Option<&'a str>,
}

impl fmt::Display for PublicView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_header(f, self.clock_line)?;
        write_body(f, self.ctx, self.frame)
    }
}

/// Admin view of one frame: controls, any pending error, then the card.
pub struct AdminView<'a> {
    pub ctx: &'a DisplayContext,
    pub frame: &'a Frame,
    pub clock_line: Option<&'a str>,
}

impl fmt::Display for AdminView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_header(f, self.clock_line)?;
        writeln!(f, "ADMIN MODE")?;

        if let Some(error) = self.ctx.last_error() {
            writeln!(f, "! {error}")?;
        }

        let active = self.ctx.is_active();
        writeln!(f)?;
        writeln!(f, "Controls:")?;
        writeln!(f, "  [s] Start Challenge{}", if active { " (running)" } else { "" })?;
        writeln!(f, "  [r] Reset Data")?;
        if active {
            let keys = ['p', 'b', 'u', 'h'];
            for (key, item) in keys.iter().zip(FoodItem::ALL) {
                writeln!(f, "  [{key}] {}", item.action_label())?;
            }
        }
        writeln!(f, "  [q] Quit")?;

        write_body(f, self.ctx, self.frame)
    }
}

/// Public view. The card only appears while a challenge is active.
pub fn render_public(ctx: &DisplayContext, frame: &Frame, clock_line: Option<&str>) -> String {
    PublicView {
        ctx,
        frame,
        clock_line,
    }
    .to_string()
}

pub fn render_admin(ctx: &DisplayContext, frame: &Frame, clock_line: Option<&str>) -> String {
    AdminView {
        ctx,
        frame,
        clock_line,
    }
    .to_string()
}

/// Admin console key for a food item, matching [`render_admin`].
pub fn item_for_key(key: char) -> Option<FoodItem> {
    match key.to_ascii_lowercase() {
        'p' => Some(FoodItem::Pancake),
        'b' => Some(FoodItem::BaconStrip),
        'u' => Some(FoodItem::SausageLink),
        'h' => Some(FoodItem::HelperPancake),
        _ => None,
    }
}
