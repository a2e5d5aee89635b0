//! Mutation commands issued from the admin view.
//!
//! Each command talks straight to the store; the countdown engine is not
//! involved. Failures are returned to the caller, never retried here.

use chrono::Utc;
use tracing::{info, warn};

use crate::challenge::{ChallengePatch, ChallengeState, FoodItem, TimePatch};
use crate::error::{CommandError, CoreError, Result};
use crate::events::Event;
use crate::store::ChallengeStore;

/// Which command failed, for the message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Start,
    Reset,
    Increment,
}

impl CommandKind {
    /// Message shown when the store rejects the write.
    pub fn failure_message(self) -> &'static str {
        match self {
            CommandKind::Start => "Failed to start challenge. Please try again.",
            CommandKind::Reset => "Failed to reset challenge. Please try again.",
            CommandKind::Increment => "Failed to update data. Please try again.",
        }
    }

    /// User-facing text for `err`. Refusals keep their own wording; store
    /// and IO failures collapse into [`failure_message`](Self::failure_message).
    pub fn describe(self, err: &CoreError) -> String {
        match err {
            CoreError::Command(refusal) => refusal.to_string(),
            _ => self.failure_message().to_string(),
        }
    }
}

/// Start the countdown, stamping `startTime` with the store's clock.
///
/// Existing counters are kept; a fresh record starts at zero. The active
/// check and the write happen in one store update, so of two racing starts
/// only the first one stamps the clock.
///
/// # Errors
/// [`CommandError::AlreadyActive`] when a challenge is running, or the
/// store error if the write fails.
pub fn start(store: &dyn ChallengeStore) -> Result<Event> {
    let stamp = ChallengePatch {
        start_time: Some(TimePatch::ServerNow),
        is_active: Some(true),
        ..Default::default()
    };
    let mut carried_over = false;
    let written = store
        .update(&mut |state, now| {
            if state.is_active {
                return false;
            }
            carried_over = *state != ChallengeState::default();
            state.apply(&stamp, now);
            true
        })
        .inspect_err(|e| warn!(error = %e, "start write failed"))?;
    let Some(state) = written else {
        return Err(CommandError::AlreadyActive.into());
    };

    let start_time = state.start_time.unwrap_or_else(Utc::now);
    info!(%start_time, carried_over, "challenge started");
    Ok(Event::ChallengeStarted {
        start_time,
        carried_over,
        at: Utc::now(),
    })
}

/// Zero every counter, clear `startTime` and deactivate.
///
/// # Errors
/// [`CommandError::NotConfirmed`] unless `confirmed`, or the store error.
pub fn reset(store: &dyn ChallengeStore, confirmed: bool) -> Result<Event> {
    if !confirmed {
        return Err(CommandError::NotConfirmed.into());
    }
    store.replace(&ChallengeState::default()).inspect_err(|e| {
        warn!(error = %e, "reset write failed");
    })?;
    info!("challenge reset");
    Ok(Event::ChallengeReset { at: Utc::now() })
}

/// Log one more `item`. Returns `None` without writing when no challenge
/// is active.
///
/// The active check and `count + 1` run inside one store update: a reset
/// landing first turns the increment into a no-op instead of leaving a
/// counter on an inactive record.
pub fn increment_item(store: &dyn ChallengeStore, item: FoodItem) -> Result<Option<Event>> {
    let mut count = 0;
    let written = store
        .update(&mut |state, now| {
            if !state.is_active {
                return false;
            }
            count = state.count(item).saturating_add(1);
            state.apply(&item.patch(count), now);
            true
        })
        .inspect_err(|e| warn!(error = %e, %item, "increment write failed"))?;
    if written.is_none() {
        info!(%item, "ignoring item, challenge not active");
        return Ok(None);
    }

    let reduction_minutes = item_reduction_minutes(item, count);
    info!(%item, count, reduction_minutes, "item logged");
    Ok(Some(Event::ItemLogged {
        item,
        count,
        reduction_minutes,
        at: Utc::now(),
    }))
}

/// Minutes the `count`-th unit of `item` takes off the clock.
fn item_reduction_minutes(item: FoodItem, count: u32) -> u64 {
    match item {
        FoodItem::Pancake => 60,
        FoodItem::HelperPancake => 30,
        FoodItem::BaconStrip | FoodItem::SausageLink if count % 2 == 0 => 15,
        FoodItem::BaconStrip | FoodItem::SausageLink => 0,
    }
}

/// Run `f`, turning failures into the user-facing message for `kind`.
pub fn run_reported<T>(kind: CommandKind, f: impl FnOnce() -> Result<T>) -> Result<T, String> {
    f().map_err(|e| kind.describe(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::{FixedClock, MemoryStore, Snapshot, Subscription};
    use chrono::{DateTime, Duration, TimeZone};
    use std::sync::{Arc, Mutex};
    use std::thread;

    type Hook = Box<dyn FnOnce(&MemoryStore) + Send>;

    /// Lets another writer slip in once, right after the caller's read and
    /// before its write, whichever store call the caller uses for either.
    struct Interleaved {
        inner: MemoryStore,
        hook: Mutex<Option<Hook>>,
    }

    impl Interleaved {
        fn new(inner: MemoryStore, hook: impl FnOnce(&MemoryStore) + Send + 'static) -> Self {
            Self {
                inner,
                hook: Mutex::new(Some(Box::new(hook))),
            }
        }

        fn fire(&self) {
            let hook = self.hook.lock().unwrap().take();
            if let Some(hook) = hook {
                hook(&self.inner);
            }
        }
    }

    impl ChallengeStore for Interleaved {
        fn get(&self) -> Result<Snapshot, StoreError> {
            let snapshot = self.inner.get();
            self.fire();
            snapshot
        }

        fn update(
            &self,
            f: &mut dyn FnMut(&mut ChallengeState, DateTime<Utc>) -> bool,
        ) -> Result<Option<ChallengeState>, StoreError> {
            self.fire();
            self.inner.update(f)
        }

        fn replace(&self, state: &ChallengeState) -> Result<ChallengeState, StoreError> {
            self.inner.replace(state)
        }

        fn subscribe(&self) -> Subscription {
            self.inner.subscribe()
        }
    }

    fn started_store() -> MemoryStore {
        let store = MemoryStore::new();
        start(&store).unwrap();
        store
    }

    #[test]
    fn start_creates_zeroed_record_with_store_time() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let store = MemoryStore::with_clock(Arc::new(FixedClock::new(at)));
        let event = start(&store).unwrap();
        assert!(matches!(
            event,
            Event::ChallengeStarted { start_time, carried_over: false, .. } if start_time == at
        ));
        let state = store.get().unwrap().unwrap();
        assert!(state.is_running());
        assert_eq!(state.pancakes, 0);
    }

    #[test]
    fn start_preserves_existing_counters() {
        let store = MemoryStore::new();
        store
            .replace(&ChallengeState {
                pancakes: 3,
                bacon_strips: 1,
                ..Default::default()
            })
            .unwrap();
        let event = start(&store).unwrap();
        assert!(matches!(event, Event::ChallengeStarted { carried_over: true, .. }));
        let state = store.get().unwrap().unwrap();
        assert_eq!(state.pancakes, 3);
        assert_eq!(state.bacon_strips, 1);
        assert!(state.is_active);
    }

    #[test]
    fn start_refused_while_active() {
        let store = started_store();
        let err = start(&store).unwrap_err();
        assert!(matches!(err, CoreError::Command(CommandError::AlreadyActive)));
        assert_eq!(CommandKind::Start.describe(&err), "Challenge already in progress");
    }

    #[test]
    fn increment_is_noop_when_inactive() {
        let store = MemoryStore::new();
        assert!(increment_item(&store, FoodItem::Pancake).unwrap().is_none());
        assert!(store.get().unwrap().is_none());

        store
            .replace(&ChallengeState {
                pancakes: 2,
                ..Default::default()
            })
            .unwrap();
        assert!(increment_item(&store, FoodItem::Pancake).unwrap().is_none());
        assert_eq!(store.get().unwrap().unwrap().pancakes, 2);
    }

    #[test]
    fn increment_adds_one_to_named_counter() {
        let store = started_store();
        increment_item(&store, FoodItem::SausageLink).unwrap();
        let event = increment_item(&store, FoodItem::SausageLink).unwrap().unwrap();
        assert!(matches!(
            event,
            Event::ItemLogged { count: 2, reduction_minutes: 15, .. }
        ));
        let state = store.get().unwrap().unwrap();
        assert_eq!(state.sausage_links, 2);
        assert_eq!(state.pancakes, 0);
        assert!(state.is_running());
    }

    #[test]
    fn reset_racing_an_increment_leaves_clean_record() {
        let inner = started_store();
        for _ in 0..4 {
            increment_item(&inner, FoodItem::Pancake).unwrap();
        }
        let store = Interleaved::new(inner, |s| {
            reset(s, true).unwrap();
        });

        let event = increment_item(&store, FoodItem::Pancake).unwrap();
        assert!(event.is_none());
        assert_eq!(store.get().unwrap(), Some(ChallengeState::default()));
    }

    #[test]
    fn second_racing_start_keeps_first_start_time() {
        let first = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let clock = Arc::new(FixedClock::new(first));
        let inner = MemoryStore::with_clock(clock.clone());
        let store = Interleaved::new(inner, move |s| {
            start(s).unwrap();
            clock.advance(Duration::minutes(5));
        });

        let err = start(&store).unwrap_err();
        assert!(matches!(err, CoreError::Command(CommandError::AlreadyActive)));
        assert_eq!(store.get().unwrap().unwrap().start_time, Some(first));
    }

    #[test]
    fn concurrent_increments_and_reset_end_clean() {
        let store = Arc::new(started_store());
        let workers: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..50 {
                        increment_item(&*store, FoodItem::ALL[i % 4]).unwrap();
                    }
                })
            })
            .collect();
        reset(&*store, true).unwrap();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(store.get().unwrap(), Some(ChallengeState::default()));
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let store = Arc::new(started_store());
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..25 {
                        increment_item(&*store, FoodItem::BaconStrip).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(store.get().unwrap().unwrap().bacon_strips, 100);
    }

    #[test]
    fn first_strip_of_pair_takes_nothing_off() {
        assert_eq!(item_reduction_minutes(FoodItem::BaconStrip, 1), 0);
        assert_eq!(item_reduction_minutes(FoodItem::BaconStrip, 2), 15);
        assert_eq!(item_reduction_minutes(FoodItem::HelperPancake, 7), 30);
    }

    #[test]
    fn reset_requires_confirmation() {
        let store = started_store();
        increment_item(&store, FoodItem::Pancake).unwrap();
        let err = reset(&store, false).unwrap_err();
        assert!(matches!(err, CoreError::Command(CommandError::NotConfirmed)));
        assert_eq!(store.get().unwrap().unwrap().pancakes, 1);

        reset(&store, true).unwrap();
        assert_eq!(store.get().unwrap(), Some(ChallengeState::default()));
    }

    #[test]
    fn store_failures_map_to_user_messages() {
        let store = started_store();
        store.close();

        let err = increment_item(&store, FoodItem::Pancake).unwrap_err();
        assert!(matches!(err, CoreError::Store(StoreError::Closed)));
        assert_eq!(
            CommandKind::Increment.describe(&err),
            "Failed to update data. Please try again."
        );

        let msg = run_reported(CommandKind::Reset, || reset(&store, true)).unwrap_err();
        assert_eq!(msg, "Failed to reset challenge. Please try again.");
    }
}
