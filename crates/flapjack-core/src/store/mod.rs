//! The challenge store: one record, many watchers.
//!
//! A store holds the single [`ChallengeState`] under
//! [`CHALLENGE_KEY`](crate::challenge::CHALLENGE_KEY) and pushes the full
//! record to every subscriber after each write. Writes are a guarded
//! read-modify-write ([`ChallengeStore::update`]), a field-level merge
//! ([`ChallengePatch`]) or a full replace.
//!
//! `startTime` is always stamped by the store's own clock, never the
//! caller's, so an admin and a viewer on different machines agree on when
//! the countdown began.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use tokio::sync::watch;

use crate::challenge::{ChallengePatch, ChallengeState};
use crate::error::StoreError;

/// What a subscriber sees: the record, or `None` before the first start.
pub type Snapshot = Option<ChallengeState>;

/// Source of "now" for a store.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Backing store for the challenge record.
pub trait ChallengeStore: Send + Sync {
    /// Current record, `None` if nothing was ever written.
    fn get(&self) -> Result<Snapshot, StoreError>;

    /// Atomic read-modify-write. `f` gets the current record (defaults if
    /// none exists) and the store's clock; nothing else can write between
    /// the read and the write. Returning `false` from `f` aborts without
    /// writing. Returns the record as written, `None` when aborted.
    fn update(
        &self,
        f: &mut dyn FnMut(&mut ChallengeState, DateTime<Utc>) -> bool,
    ) -> Result<Option<ChallengeState>, StoreError>;

    /// Update only the fields named in `patch`. Creates the record from
    /// defaults if it does not exist yet. Returns the record as written.
    fn merge(&self, patch: &ChallengePatch) -> Result<ChallengeState, StoreError> {
        self.update(&mut |state, now| {
            state.apply(patch, now);
            true
        })?
        .ok_or_else(|| StoreError::QueryFailed("merge was not written".into()))
    }

    /// Overwrite the whole record.
    fn replace(&self, state: &ChallengeState) -> Result<ChallengeState, StoreError>;

    /// Watch the record. The current value is delivered first.
    fn subscribe(&self) -> Subscription;
}

/// Handle on a store's change feed.
///
/// The first [`next`](Self::next) yields the record as it was at subscribe
/// time; later calls wait for the next write. Rapid writes coalesce: a slow
/// reader sees the latest record, not every intermediate one.
///
/// Teardown is explicit through [`cancel`](Self::cancel) and also happens on
/// drop.
#[derive(Debug)]
pub struct Subscription {
    rx: Option<watch::Receiver<Snapshot>>,
    primed: bool,
}

impl Subscription {
    pub(crate) fn new(rx: watch::Receiver<Snapshot>) -> Self {
        Self {
            rx: Some(rx),
            primed: false,
        }
    }

    /// Wait for the next record. `None` once cancelled or the store is gone.
    pub async fn next(&mut self) -> Option<Snapshot> {
        let rx = self.rx.as_mut()?;
        if !self.primed {
            self.primed = true;
            return Some(rx.borrow_and_update().clone());
        }
        if rx.changed().await.is_err() {
            self.rx = None;
            return None;
        }
        Some(rx.borrow_and_update().clone())
    }

    /// Non-blocking variant of [`next`](Self::next): `None` when nothing new
    /// arrived since the last read.
    pub fn try_next(&mut self) -> Option<Snapshot> {
        let rx = self.rx.as_mut()?;
        if !self.primed {
            self.primed = true;
            return Some(rx.borrow_and_update().clone());
        }
        match rx.has_changed() {
            Ok(true) => Some(rx.borrow_and_update().clone()),
            Ok(false) => None,
            Err(_) => {
                self.rx = None;
                None
            }
        }
    }

    /// Stop receiving updates. Idempotent.
    pub fn cancel(&mut self) {
        if self.rx.take().is_some() {
            tracing::debug!("challenge subscription cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }
}

/// Shared publish side used by the store implementations.
#[derive(Debug)]
pub(crate) struct Feed {
    tx: watch::Sender<Snapshot>,
}

impl Feed {
    pub(crate) fn new(initial: Snapshot) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> Subscription {
        Subscription::new(self.tx.subscribe())
    }

    /// Push a freshly written record to every subscriber.
    pub(crate) fn publish(&self, state: &ChallengeState) {
        self.tx.send_replace(Some(state.clone()));
        tracing::debug!(subscribers = self.tx.receiver_count(), "challenge record published");
    }

    /// Push `snapshot` only if it differs from the last one published.
    pub(crate) fn publish_if_changed(&self, snapshot: Snapshot) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        })
    }

    pub(crate) fn has_subscribers(&self) -> bool {
        !self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_next_is_current_value() {
        let feed = Feed::new(None);
        let mut sub = feed.subscribe();
        assert_eq!(sub.next().await, Some(None));

        let state = ChallengeState {
            pancakes: 1,
            ..Default::default()
        };
        feed.publish(&state);
        assert_eq!(sub.next().await, Some(Some(state)));
    }

    #[test]
    fn try_next_reports_only_new_values() {
        let feed = Feed::new(None);
        let mut sub = feed.subscribe();
        assert_eq!(sub.try_next(), Some(None));
        assert_eq!(sub.try_next(), None);
        feed.publish(&ChallengeState::default());
        assert_eq!(sub.try_next(), Some(Some(ChallengeState::default())));
        assert_eq!(sub.try_next(), None);
    }

    #[tokio::test]
    async fn cancelled_subscription_goes_quiet() {
        let feed = Feed::new(None);
        let mut sub = feed.subscribe();
        sub.cancel();
        sub.cancel();
        assert!(!sub.is_active());
        feed.publish(&ChallengeState::default());
        assert_eq!(sub.next().await, None);
        assert!(!feed.has_subscribers());
    }

    #[tokio::test]
    async fn dropped_feed_ends_subscription() {
        let feed = Feed::new(None);
        let mut sub = feed.subscribe();
        assert!(sub.next().await.is_some());
        drop(feed);
        assert_eq!(sub.next().await, None);
        assert!(!sub.is_active());
    }

    #[test]
    fn publish_if_changed_skips_duplicates() {
        let feed = Feed::new(None);
        assert!(!feed.publish_if_changed(None));
        assert!(feed.publish_if_changed(Some(ChallengeState::default())));
        assert!(!feed.publish_if_changed(Some(ChallengeState::default())));
    }

    #[test]
    fn fixed_clock_advances() {
        let start = Utc::now();
        let clock = FixedClock::new(start);
        clock.advance(chrono::Duration::seconds(90));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(90));
    }
}
