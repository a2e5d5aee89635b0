use chrono::Utc;
use flapjack_core::view::render_public;
use flapjack_core::{ChallengeStore, DisplayContext, Event};

use super::{AppContext, CliResult};

pub fn run(ctx: &AppContext, json: bool) -> CliResult {
    let store = ctx.open_store()?;
    let state = store.get()?;
    let now = Utc::now();

    if json {
        let snapshot = Event::snapshot(state.as_ref(), now);
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let mut display = DisplayContext::new();
    display.on_push(state);
    let frame = display.recompute(now);
    print!("{}", render_public(&display, &frame, ctx.clock_line().as_deref()));
    Ok(())
}
