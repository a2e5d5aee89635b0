use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use super::{ChallengeStore, Feed, Snapshot, Subscription};
use crate::challenge::{ChallengeState, CHALLENGE_KEY};
use crate::error::StoreError;
use crate::storage::Database;

/// Store backed by a SQLite file shared between processes.
///
/// Writes made through this handle are published immediately. Writes from
/// other processes reach subscribers once [`spawn_poller`](Self::spawn_poller)
/// is running.
pub struct SqliteStore {
    db: Mutex<Database>,
    feed: Feed,
}

impl SqliteStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::from_database(Database::open(path)?)
    }

    /// In-memory store (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        Self::from_database(Database::open_memory()?)
    }

    fn from_database(db: Database) -> Result<Self, StoreError> {
        let initial = read_record(&db)?;
        tracing::debug!(present = initial.is_some(), "challenge store opened");
        Ok(Self {
            db: Mutex::new(db),
            feed: Feed::new(initial),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>, StoreError> {
        self.db
            .lock()
            .map_err(|_| StoreError::QueryFailed("database handle poisoned".into()))
    }

    /// Encode and store `state` inside an open write transaction.
    fn put(db: &Database, state: &ChallengeState) -> Result<(), StoreError> {
        let json =
            serde_json::to_string(state).map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        db.kv_set(CHALLENGE_KEY, &json)?;
        Ok(())
    }

    /// Re-read the record and publish it if another process changed it.
    pub fn refresh(&self) -> Result<bool, StoreError> {
        let snapshot = {
            let db = self.lock()?;
            read_record(&db)?
        };
        Ok(self.feed.publish_if_changed(snapshot))
    }

    /// Poll the file every `interval` until the last subscriber goes away.
    ///
    /// Must be called from within a tokio runtime, after subscribing.
    pub fn spawn_poller(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if !store.feed.has_subscribers() {
                    tracing::debug!("no subscribers left, stopping store poller");
                    break;
                }
                let polled = Arc::clone(&store);
                match tokio::task::spawn_blocking(move || polled.refresh()).await {
                    Ok(Ok(true)) => tracing::debug!("picked up external challenge write"),
                    Ok(Ok(false)) => {}
                    Ok(Err(e)) => tracing::warn!(error = %e, "failed to poll challenge store"),
                    Err(e) => {
                        tracing::warn!(error = %e, "store poll task failed");
                        break;
                    }
                }
            }
        })
    }
}

/// Read the record. One that no longer decodes reads as absent, so the
/// views fall back to "not started" and a reset overwrites it.
fn read_record(db: &Database) -> Result<Snapshot, StoreError> {
    let Some(json) = db.kv_get(CHALLENGE_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_str(&json) {
        Ok(state) => Ok(Some(state)),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring undecodable challenge record");
            Ok(None)
        }
    }
}

impl ChallengeStore for SqliteStore {
    fn get(&self) -> Result<Snapshot, StoreError> {
        let db = self.lock()?;
        read_record(&db)
    }

    /// Runs `f` inside one immediate transaction, so a second process
    /// waits on the write lock until this one commits or rolls back.
    fn update(
        &self,
        f: &mut dyn FnMut(&mut ChallengeState, DateTime<Utc>) -> bool,
    ) -> Result<Option<ChallengeState>, StoreError> {
        let db = self.lock()?;
        let tx = db.begin_write()?;
        let mut state = read_record(&db)?.unwrap_or_default();
        let now = db.server_now()?;
        if !f(&mut state, now) {
            // Dropping the transaction rolls it back.
            return Ok(None);
        }
        Self::put(&db, &state)?;
        tx.commit()?;
        drop(db);

        self.feed.publish(&state);
        Ok(Some(state))
    }

    fn replace(&self, state: &ChallengeState) -> Result<ChallengeState, StoreError> {
        let db = self.lock()?;
        let tx = db.begin_write()?;
        Self::put(&db, state)?;
        tx.commit()?;
        drop(db);

        self.feed.publish(state);
        Ok(state.clone())
    }

    fn subscribe(&self) -> Subscription {
        self.feed.subscribe()
    }
}
