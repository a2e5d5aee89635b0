//! Long-running views: the public `watch` screen and the admin console.
//!
//! Both loops feed a single [`DisplayContext`] from two independent
//! triggers, the tick interval and the store subscription, and recompute
//! the frame after either fires.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use flapjack_core::commands::{self, run_reported, CommandKind};
use flapjack_core::view::{item_for_key, render_admin, render_public};
use flapjack_core::{ChallengeStore, DisplayContext, Event, SqliteStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::challenge::{is_yes, RESET_PROMPT};
use super::{AppContext, CliResult};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

fn draw(screen: &str) -> CliResult {
    let mut out = std::io::stdout().lock();
    write!(out, "{CLEAR_SCREEN}{screen}")?;
    out.flush()?;
    Ok(())
}

fn intervals(ctx: &AppContext) -> (Duration, Duration) {
    let tick = Duration::from_millis(ctx.config.display.tick_interval_ms.max(50));
    let poll = Duration::from_millis(ctx.config.store.poll_interval_ms.max(50));
    (tick, poll)
}

/// Public view until Ctrl-C.
pub fn watch(ctx: &AppContext) -> CliResult {
    let store = ctx.open_store()?;
    runtime()?.block_on(watch_loop(ctx, store))
}

async fn watch_loop(ctx: &AppContext, store: Arc<SqliteStore>) -> CliResult {
    let (tick, poll) = intervals(ctx);
    let mut subscription = store.subscribe();
    let poller = store.spawn_poller(poll);
    let mut display = DisplayContext::new();
    let mut ticker = tokio::time::interval(tick);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            pushed = subscription.next() => match pushed {
                Some(snapshot) => display.on_push(snapshot),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
        let frame = display.recompute(Utc::now());
        if frame.celebration_started {
            tracing::info!("challenge completed");
        }
        draw(&render_public(&display, &frame, ctx.clock_line().as_deref()))?;
    }

    subscription.cancel();
    poller.abort();
    Ok(())
}

/// Outcome of a fire-and-forget command, sent back to the console loop.
struct Report {
    kind: CommandKind,
    outcome: Result<Option<Event>, String>,
}

enum Input {
    Start,
    Reset,
    Item(flapjack_core::FoodItem),
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let key = line.trim().chars().next()?;
    match key.to_ascii_lowercase() {
        's' => Some(Input::Start),
        'r' => Some(Input::Reset),
        'q' => Some(Input::Quit),
        other => item_for_key(other).map(Input::Item),
    }
}

/// Run `input` on a blocking task; the result comes back over `reports`.
fn dispatch(store: Arc<dyn ChallengeStore>, input: Input, reports: mpsc::UnboundedSender<Report>) {
    tokio::task::spawn_blocking(move || {
        let (kind, outcome) = match input {
            Input::Start => (
                CommandKind::Start,
                run_reported(CommandKind::Start, || commands::start(&*store).map(Some)),
            ),
            Input::Reset => (
                CommandKind::Reset,
                run_reported(CommandKind::Reset, || commands::reset(&*store, true).map(Some)),
            ),
            Input::Item(item) => (
                CommandKind::Increment,
                run_reported(CommandKind::Increment, || {
                    commands::increment_item(&*store, item)
                }),
            ),
            Input::Quit => return,
        };
        // The console may already be gone.
        let _ = reports.send(Report { kind, outcome });
    });
}

/// Interactive admin console until `q` or Ctrl-C.
pub fn admin(ctx: &AppContext) -> CliResult {
    ctx.require_admin()?;
    let store = ctx.open_store()?;
    let runtime = runtime()?;
    let result = runtime.block_on(admin_loop(ctx, store));
    // A pending stdin read would otherwise hold shutdown.
    runtime.shutdown_background();
    result
}

async fn admin_loop(ctx: &AppContext, store: Arc<SqliteStore>) -> CliResult {
    let (tick, poll) = intervals(ctx);
    let mut subscription = store.subscribe();
    let poller = store.spawn_poller(poll);
    let shared: Arc<dyn ChallengeStore> = store.clone();
    let (report_tx, mut report_rx) = mpsc::unbounded_channel::<Report>();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut display = DisplayContext::new();
    let mut ticker = tokio::time::interval(tick);
    let mut confirming_reset = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            pushed = subscription.next() => match pushed {
                Some(snapshot) => display.on_push(snapshot),
                None => break,
            },
            Some(report) = report_rx.recv() => match report.outcome {
                Ok(event) => {
                    display.clear_error();
                    tracing::debug!(kind = ?report.kind, ?event, "command finished");
                }
                Err(message) => display.on_error(message),
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if confirming_reset {
                    confirming_reset = false;
                    if is_yes(&line) {
                        dispatch(shared.clone(), Input::Reset, report_tx.clone());
                    }
                } else {
                    match parse_input(&line) {
                        Some(Input::Quit) => break,
                        Some(Input::Reset) => confirming_reset = true,
                        // The view hides these; ignore them the same way.
                        Some(Input::Start) if display.is_active() => {}
                        Some(Input::Item(_)) if !display.is_active() => {}
                        Some(input) => dispatch(shared.clone(), input, report_tx.clone()),
                        None => {}
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }

        let frame = display.recompute(Utc::now());
        let mut screen = render_admin(&display, &frame, ctx.clock_line().as_deref());
        if confirming_reset {
            screen.push_str(&format!("\n{RESET_PROMPT} [y/N] "));
        } else {
            screen.push_str("\n> ");
        }
        draw(&screen)?;
    }

    subscription.cancel();
    poller.abort();
    Ok(())
}
