use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use super::{ChallengeStore, Clock, Feed, Snapshot, Subscription, SystemClock};
use crate::challenge::ChallengeState;
use crate::error::StoreError;

/// Process-local store. The "server" clock is whatever [`Clock`] it was
/// built with.
pub struct MemoryStore {
    record: Mutex<Snapshot>,
    feed: Feed,
    clock: Arc<dyn Clock>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            record: Mutex::new(None),
            feed: Feed::new(None),
            clock,
            closed: AtomicBool::new(false),
        }
    }

    /// Refuse every later write with [`StoreError::Closed`]. Reads and
    /// existing subscriptions keep working.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn write(
        &self,
        f: impl FnOnce(&mut ChallengeState) -> bool,
    ) -> Result<Option<ChallengeState>, StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        let mut record = self
            .record
            .lock()
            .map_err(|_| StoreError::QueryFailed("memory store poisoned".into()))?;
        let mut draft = record.clone().unwrap_or_default();
        if !f(&mut draft) {
            return Ok(None);
        }
        *record = Some(draft.clone());
        self.feed.publish(&draft);
        Ok(Some(draft))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChallengeStore for MemoryStore {
    fn get(&self) -> Result<Snapshot, StoreError> {
        self.record
            .lock()
            .map(|r| r.clone())
            .map_err(|_| StoreError::QueryFailed("memory store poisoned".into()))
    }

    fn update(
        &self,
        f: &mut dyn FnMut(&mut ChallengeState, DateTime<Utc>) -> bool,
    ) -> Result<Option<ChallengeState>, StoreError> {
        let now = self.clock.now();
        self.write(|state| f(state, now))
    }

    fn replace(&self, state: &ChallengeState) -> Result<ChallengeState, StoreError> {
        self.write(|current| {
            *current = state.clone();
            true
        })?
        .ok_or_else(|| StoreError::QueryFailed("replace was not written".into()))
    }

    fn subscribe(&self) -> Subscription {
        self.feed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::{ChallengePatch, FoodItem, TimePatch};
    use crate::store::FixedClock;
    use chrono::TimeZone;

    #[test]
    fn empty_until_first_write() {
        let store = MemoryStore::new();
        assert_eq!(store.get().unwrap(), None);
        let written = store.merge(&FoodItem::Pancake.patch(1)).unwrap();
        assert_eq!(written.pancakes, 1);
        assert_eq!(store.get().unwrap(), Some(written));
    }

    #[test]
    fn server_now_comes_from_store_clock() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let store = MemoryStore::with_clock(Arc::new(FixedClock::new(at)));
        let patch = ChallengePatch {
            start_time: Some(TimePatch::ServerNow),
            ..Default::default()
        };
        assert_eq!(store.merge(&patch).unwrap().start_time, Some(at));
    }

    #[test]
    fn closed_store_rejects_writes() {
        let store = MemoryStore::new();
        store.merge(&FoodItem::Pancake.patch(2)).unwrap();
        store.close();
        assert!(matches!(
            store.merge(&FoodItem::Pancake.patch(3)),
            Err(StoreError::Closed)
        ));
        assert!(matches!(
            store.replace(&ChallengeState::default()),
            Err(StoreError::Closed)
        ));
        assert_eq!(store.get().unwrap().map(|s| s.pancakes), Some(2));
    }

    #[test]
    fn aborted_update_writes_nothing() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe();
        assert_eq!(sub.try_next(), Some(None));

        let written = store
            .update(&mut |state, _| {
                state.pancakes = 9;
                false
            })
            .unwrap();
        assert!(written.is_none());
        assert!(store.get().unwrap().is_none());
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn writes_reach_subscribers() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe();
        assert_eq!(sub.try_next(), Some(None));
        store.merge(&FoodItem::BaconStrip.patch(1)).unwrap();
        let pushed = sub.try_next().flatten().unwrap();
        assert_eq!(pushed.bacon_strips, 1);
    }
}
