use std::io::{IsTerminal, Write};

use flapjack_core::commands::{self, run_reported, CommandKind};
use flapjack_core::FoodItem;

use super::{AppContext, CliResult};

pub const RESET_PROMPT: &str =
    "Are you sure you want to reset the challenge? This will clear all current data.";

pub fn start(ctx: &AppContext) -> CliResult {
    ctx.require_admin()?;
    let store = ctx.open_store()?;
    let event = run_reported(CommandKind::Start, || commands::start(&*store))?;
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}

pub fn add(ctx: &AppContext, item: FoodItem) -> CliResult {
    ctx.require_admin()?;
    let store = ctx.open_store()?;
    match run_reported(CommandKind::Increment, || commands::increment_item(&*store, item))? {
        Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
        None => eprintln!("Challenge is not active; {item} not logged."),
    }
    Ok(())
}

pub fn reset(ctx: &AppContext, yes: bool) -> CliResult {
    ctx.require_admin()?;
    let confirmed = yes || confirm(RESET_PROMPT)?;
    let store = ctx.open_store()?;
    let event = run_reported(CommandKind::Reset, || commands::reset(&*store, confirmed))?;
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}

/// y/N prompt on the terminal. Never confirms when stdin is not a terminal.
fn confirm(prompt: &str) -> CliResult<bool> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return Ok(false);
    }
    eprint!("{prompt} [y/N] ");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    stdin.read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
