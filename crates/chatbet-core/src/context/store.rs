//! Process-wide store of conversation sessions.
//!
//! Sessions live in a concurrent map keyed by session id; each session sits
//! behind its own async mutex so that turns for one session are serialized
//! while different sessions proceed independently. The store starts empty,
//! creates sessions lazily, and forgets everything on restart.

use std::sync::Arc;
use std::time::Duration;

use chatbet_types::chat::{Session, Turn};
use chatbet_types::config::ChatBetConfig;
use chatbet_types::error::SessionError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Exclusive access to one session for the duration of a turn.
pub type SessionGuard = OwnedMutexGuard<Session>;

pub struct ContextStore {
    sessions: DashMap<String, Arc<Mutex<Session>>>,
    max_history: usize,
    timeout: chrono::Duration,
}

impl ContextStore {
    pub fn new(max_history: usize, timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            max_history,
            timeout: chrono::Duration::from_std(timeout)
                .unwrap_or_else(|_| chrono::Duration::days(365)),
        }
    }

    pub fn from_config(config: &ChatBetConfig) -> Self {
        Self::new(
            config.max_history,
            Duration::from_secs(config.session_timeout_secs),
        )
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Return a copy of the session, creating it on first use.
    pub async fn get_or_create(&self, session_id: &str, user_key: Option<&str>) -> Session {
        self.lock(session_id, user_key).await.clone()
    }

    /// Acquire exclusive access to a session, creating it on first use.
    ///
    /// An expired session found here is replaced by a fresh one. Callers
    /// hold the guard for the whole turn so that concurrent turns for the
    /// same session are applied in processing order.
    pub async fn lock(&self, session_id: &str, user_key: Option<&str>) -> SessionGuard {
        self.lock_at(session_id, user_key, Utc::now()).await
    }

    pub async fn lock_at(
        &self,
        session_id: &str,
        user_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> SessionGuard {
        loop {
            let handle = self.handle(session_id, user_key, now);
            let mut guard = Arc::clone(&handle).lock_owned().await;

            // The entry may have been pruned while we waited for the lock.
            let live = self
                .sessions
                .get(session_id)
                .is_some_and(|entry| Arc::ptr_eq(entry.value(), &handle));
            if !live {
                continue;
            }

            if guard.is_expired(now, self.timeout) {
                let expired = SessionError::Timeout {
                    session_id: session_id.to_string(),
                    idle_secs: (now - guard.last_activity).num_seconds(),
                };
                debug!(error = %expired, "replacing expired session");
                *guard = Session::new(session_id, user_key.map(str::to_string), now);
            }
            if guard.user_key.is_none() {
                guard.user_key = user_key.map(str::to_string);
            }
            return guard;
        }
    }

    /// Append a turn to a session held by the caller.
    pub fn append_locked(&self, session: &mut Session, turn: Turn) {
        session.push_turn(turn, self.max_history);
    }

    /// Append a turn, trimming history to the most recent `max_history` turns.
    pub async fn append_turn(&self, session_id: &str, turn: Turn) {
        let mut session = self.lock_at(session_id, None, turn.timestamp).await;
        self.append_locked(&mut session, turn);
    }

    /// Copy of a live session without creating one.
    pub async fn snapshot(&self, session_id: &str) -> Option<Session> {
        let handle = self.sessions.get(session_id).map(|e| Arc::clone(e.value()))?;
        let session = handle.lock().await;
        if session.is_expired(Utc::now(), self.timeout) {
            None
        } else {
            Some(session.clone())
        }
    }

    /// Remove sessions idle for longer than the configured timeout.
    pub fn prune(&self) -> usize {
        self.prune_at(Utc::now())
    }

    /// Remove sessions idle at `now`. Sessions locked by an in-flight turn are kept.
    pub fn prune_at(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.sessions.retain(|session_id, handle| match handle.try_lock() {
            Ok(session) if session.is_expired(now, self.timeout) => {
                debug!(%session_id, "evicting idle session");
                removed += 1;
                false
            }
            _ => true,
        });
        removed
    }

    /// Periodically prune until `cancel` fires.
    pub fn spawn_pruner(self: Arc<Self>, every: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("session pruner stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = self.prune();
                        if removed > 0 {
                            info!(removed, remaining = self.len(), "pruned expired sessions");
                        }
                    }
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn handle(&self, session_id: &str, user_key: Option<&str>, now: DateTime<Utc>) -> Arc<Mutex<Session>> {
        let entry = self.sessions.entry(session_id.to_string()).or_insert_with(|| {
            debug!(%session_id, "creating session");
            Arc::new(Mutex::new(Session::new(
                session_id,
                user_key.map(str::to_string),
                now,
            )))
        });
        Arc::clone(entry.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    const MAX_HISTORY: usize = 10;

    fn store() -> ContextStore {
        ContextStore::new(MAX_HISTORY, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn get_or_create_creates_once() {
        let store = store();
        let first = store.get_or_create("s1", Some("user-1")).await;
        let second = store.get_or_create("s1", None).await;
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.user_key.as_deref(), Some("user-1"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn append_trims_to_max_history_preserving_order() {
        let store = store();
        let start = Utc::now();
        let k = 3;
        for i in 0..(MAX_HISTORY + k) {
            let at = start + ChronoDuration::seconds(i as i64);
            store.append_turn("s1", Turn::user(format!("m{i}"), at)).await;
        }

        let session = store.snapshot("s1").await.unwrap();
        let texts: Vec<String> = session.turns.iter().map(|t| t.text.clone()).collect();
        let expected: Vec<String> = (k..MAX_HISTORY + k).map(|i| format!("m{i}")).collect();
        assert_eq!(texts, expected);
    }

    #[tokio::test]
    async fn expired_session_is_replaced_on_access() {
        let store = store();
        let t0 = Utc::now();
        {
            let mut session = store.lock_at("s1", None, t0).await;
            store.append_locked(&mut session, Turn::user("old", t0));
        }

        let later = t0 + ChronoDuration::seconds(3601);
        let session = store.lock_at("s1", None, later).await;
        assert!(session.turns.is_empty());
        assert_eq!(session.created_at, later);
    }

    #[tokio::test]
    async fn prune_removes_only_idle_sessions() {
        let store = store();
        let t0 = Utc::now();
        store.append_turn("idle", Turn::user("a", t0)).await;
        store
            .append_turn("active", Turn::user("b", t0 + ChronoDuration::seconds(3000)))
            .await;

        let removed = store.prune_at(t0 + ChronoDuration::seconds(3700));
        assert_eq!(removed, 1);
        assert!(store.sessions.contains_key("active"));
        assert!(!store.sessions.contains_key("idle"));
    }

    #[tokio::test]
    async fn prune_skips_sessions_locked_by_a_turn() {
        let store = store();
        let t0 = Utc::now();
        let _guard = store.lock_at("busy", None, t0).await;
        assert_eq!(store.prune_at(t0 + ChronoDuration::days(1)), 0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn turns_for_one_session_are_serialized() {
        let store = Arc::new(store());
        let now = Utc::now();

        let mut guard = store.lock_at("s1", None, now).await;
        store.append_locked(&mut guard, Turn::user("a1", now));

        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store.append_turn("s1", Turn::user("b", Utc::now())).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        store.append_locked(&mut guard, Turn::user("a2", now));
        drop(guard);
        waiter.await.unwrap();

        let session = store.snapshot("s1").await.unwrap();
        let texts: Vec<&str> = session.turns.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a1", "a2", "b"]);
    }

    #[tokio::test]
    async fn sessions_do_not_share_history() {
        let store = Arc::new(store());
        let mut handles = Vec::new();
        for s in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for i in 0..5 {
                    store
                        .append_turn(&format!("s{s}"), Turn::user(format!("s{s}-m{i}"), Utc::now()))
                        .await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        for s in 0..8 {
            let session = store.snapshot(&format!("s{s}")).await.unwrap();
            assert_eq!(session.turns.len(), 5);
            assert!(session.turns.iter().all(|t| t.text.starts_with(&format!("s{s}-"))));
        }
    }

    #[tokio::test]
    async fn snapshot_of_unknown_session_is_none() {
        assert!(store().snapshot("nope").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn pruner_stops_on_cancel() {
        let store = Arc::new(store());
        let cancel = CancellationToken::new();
        let handle = Arc::clone(&store).spawn_pruner(Duration::from_secs(60), cancel.clone());
        tokio::time::sleep(Duration::from_secs(120)).await;
        cancel.cancel();
        handle.await.unwrap();
    }
}
