//! Subscription registry: the single source of truth for which subscriber
//! keys have a live watcher.
//!
//! Every map access goes through one `tokio::sync::Mutex` and holds it only
//! for O(1) map work; checker and notifier calls never run under the lock.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use seatwatch_core::error::RegistryError;
use seatwatch_core::traits::{AvailabilityChecker, Notifier};
use seatwatch_core::types::{SubscriberKey, SubscriptionId, WatchTarget};
use tokio::sync::Mutex;

use crate::cancel::{CancelHandle, cancellation};
use crate::watcher::Watcher;

/// A live subscription. Present in the map exactly while its watcher runs.
#[derive(Debug)]
pub(crate) struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) target: WatchTarget,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) cancel: CancelHandle,
}

pub(crate) type SharedSubscriptions = Arc<Mutex<HashMap<SubscriberKey, Subscription>>>;

/// Snapshot of one active subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionInfo {
    pub id: SubscriptionId,
    pub key: SubscriberKey,
    pub target: WatchTarget,
    pub started_at: DateTime<Utc>,
}

/// Answer to a status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchStatus {
    Running(SubscriptionInfo),
    NotFound,
}

/// Starts, tracks and cancels one watcher task per subscriber key.
pub struct SubscriptionRegistry {
    subscriptions: SharedSubscriptions,
    checker: Arc<dyn AvailabilityChecker>,
    notifier: Arc<dyn Notifier>,
    next_id: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new(checker: Arc<dyn AvailabilityChecker>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
            checker,
            notifier,
            next_id: AtomicU64::new(1),
        }
    }

    /// Start watching `target` for `key`.
    ///
    /// Fails with [`RegistryError::AlreadyActive`] if `key` already has a
    /// watcher; the check and the insert happen under one lock acquisition.
    /// The watcher is spawned after the lock is released. Must be called
    /// from within a tokio runtime.
    pub async fn start(
        &self,
        key: SubscriberKey,
        target: WatchTarget,
    ) -> Result<SubscriptionId, RegistryError> {
        let (id, cancelled) = {
            let mut subs = self.subscriptions.lock().await;
            let slot = match subs.entry(key.clone()) {
                Entry::Occupied(_) => return Err(RegistryError::AlreadyActive(key)),
                Entry::Vacant(slot) => slot,
            };
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let (cancel, cancelled) = cancellation();
            slot.insert(Subscription {
                id,
                target: target.clone(),
                started_at: Utc::now(),
                cancel,
            });
            (id, cancelled)
        };

        tracing::info!("📅 Course availability check #{id} started for {key} ({target})");

        let watcher = Watcher {
            id,
            key,
            target,
            checker: self.checker.clone(),
            notifier: self.notifier.clone(),
            subscriptions: self.subscriptions.clone(),
        };
        tokio::spawn(watcher.run(cancelled));

        Ok(id)
    }

    /// Stop the watcher for `key`.
    ///
    /// The entry is removed before its handle fires, so the handle is
    /// signalled at most once. A check already in flight may still finish.
    pub async fn stop(&self, key: &SubscriberKey) -> Result<(), RegistryError> {
        let mut subs = self.subscriptions.lock().await;
        let Some(sub) = subs.remove(key) else {
            return Err(RegistryError::NotFound(key.clone()));
        };
        sub.cancel.cancel();
        tracing::info!("🛑 Course check #{} stopped for {key}", sub.id);
        Ok(())
    }

    /// Whether `key` currently has a live watcher.
    pub async fn status(&self, key: &SubscriberKey) -> WatchStatus {
        let subs = self.subscriptions.lock().await;
        match subs.get(key) {
            Some(sub) => WatchStatus::Running(info(key, sub)),
            None => WatchStatus::NotFound,
        }
    }

    /// All active subscriptions, ordered by key.
    pub async fn list(&self) -> Vec<SubscriptionInfo> {
        let subs = self.subscriptions.lock().await;
        let mut all: Vec<_> = subs.iter().map(|(key, sub)| info(key, sub)).collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }

    pub async fn active_count(&self) -> usize {
        self.subscriptions.lock().await.len()
    }

    /// Cancel every active watch. Returns how many were cancelled.
    pub async fn shutdown(&self) -> usize {
        let drained: Vec<_> = self.subscriptions.lock().await.drain().collect();
        let count = drained.len();
        for (_, sub) in drained {
            sub.cancel.cancel();
        }
        if count > 0 {
            tracing::info!("🛑 Cancelled {count} active course check(s)");
        }
        count
    }
}

fn info(key: &SubscriberKey, sub: &Subscription) -> SubscriptionInfo {
    SubscriptionInfo {
        id: sub.id,
        key: key.clone(),
        target: sub.target.clone(),
        started_at: sub.started_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use seatwatch_core::error::{Result, SeatWatchError};
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    const INTERVAL: Duration = Duration::from_secs(60);

    /// Replays a script of results, then keeps answering `fallback`.
    struct ScriptedChecker {
        script: StdMutex<VecDeque<std::result::Result<i64, String>>>,
        fallback: i64,
        calls: AtomicUsize,
    }

    impl ScriptedChecker {
        fn new(script: Vec<std::result::Result<i64, String>>, fallback: i64) -> Arc<Self> {
            Arc::new(Self {
                script: StdMutex::new(script.into()),
                fallback,
                calls: AtomicUsize::new(0),
            })
        }

        fn always(count: i64) -> Arc<Self> {
            Self::new(Vec::new(), count)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AvailabilityChecker for ScriptedChecker {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn check(&self, _target: &WatchTarget) -> Result<i64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().unwrap().pop_front() {
                Some(Ok(count)) => Ok(count),
                Some(Err(e)) => Err(SeatWatchError::Checker(e)),
                None => Ok(self.fallback),
            }
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: StdMutex<Vec<(String, i64, String)>>,
        attempts: AtomicUsize,
        fail: bool,
    }

    impl RecordingNotifier {
        fn failing() -> Arc<Self> {
            Arc::new(Self {
                fail: true,
                ..Default::default()
            })
        }

        fn sent(&self) -> Vec<(String, i64, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn notify(&self, key: &SubscriberKey, available: i64, target: &WatchTarget) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SeatWatchError::Notifier("mailbox unavailable".into()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((key.to_string(), available, target.crn.clone()));
            Ok(())
        }
    }

    fn key(s: &str) -> SubscriberKey {
        SubscriberKey::parse(s).unwrap()
    }

    fn target(crn: &str) -> WatchTarget {
        WatchTarget::new(crn, "202430", INTERVAL)
    }

    fn registry(checker: Arc<ScriptedChecker>, notifier: Arc<RecordingNotifier>) -> SubscriptionRegistry {
        SubscriptionRegistry::new(checker, notifier)
    }

    /// Sleep just past `ticks` poll intervals (paused clock auto-advances).
    async fn after_ticks(ticks: u32) {
        tokio::time::sleep(INTERVAL * ticks + Duration::from_secs(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_already_active() {
        let checker = ScriptedChecker::always(0);
        let reg = registry(checker.clone(), Arc::default());

        reg.start(key("a@neu.edu"), target("30001")).await.unwrap();
        let err = reg.start(key("a@neu.edu"), target("30002")).await.unwrap_err();
        assert_eq!(err, RegistryError::AlreadyActive(key("a@neu.edu")));
        assert_eq!(reg.active_count().await, 1);

        // Only one watcher polls.
        after_ticks(1).await;
        assert_eq!(checker.calls(), 1);

        // The first target is the one being watched.
        match reg.status(&key("a@neu.edu")).await {
            WatchStatus::Running(info) => assert_eq!(info.target.crn, "30001"),
            WatchStatus::NotFound => panic!("expected a running watch"),
        }
    }

    #[tokio::test]
    async fn test_stop_unknown_is_not_found() {
        let reg = registry(ScriptedChecker::always(0), Arc::default());
        let err = reg.stop(&key("nobody@neu.edu")).await.unwrap_err();
        assert_eq!(err, RegistryError::NotFound(key("nobody@neu.edu")));
    }

    #[tokio::test]
    async fn test_start_stop_round_trip() {
        let reg = registry(ScriptedChecker::always(0), Arc::default());
        reg.start(key("a@neu.edu"), target("30001")).await.unwrap();
        assert!(reg.stop(&key("a@neu.edu")).await.is_ok());
        assert_eq!(
            reg.stop(&key("a@neu.edu")).await,
            Err(RegistryError::NotFound(key("a@neu.edu")))
        );
        assert_eq!(reg.status(&key("a@neu.edu")).await, WatchStatus::NotFound);
    }

    #[tokio::test]
    async fn test_resubscribe_after_stop() {
        let reg = registry(ScriptedChecker::always(0), Arc::default());
        let first = reg.start(key("a@neu.edu"), target("30001")).await.unwrap();
        reg.stop(&key("a@neu.edu")).await.unwrap();
        let second = reg.start(key("a@neu.edu"), target("30002")).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_polling() {
        let checker = ScriptedChecker::always(0);
        let reg = registry(checker.clone(), Arc::default());

        reg.start(key("a@neu.edu"), target("30001")).await.unwrap();
        after_ticks(2).await;
        assert_eq!(checker.calls(), 2);

        reg.stop(&key("a@neu.edu")).await.unwrap();
        after_ticks(10).await;
        assert_eq!(checker.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_on_tick_boundary_wins() {
        let checker = ScriptedChecker::always(5);
        let notifier = Arc::new(RecordingNotifier::default());
        let reg = registry(checker.clone(), notifier.clone());

        reg.start(key("a@neu.edu"), target("30001")).await.unwrap();
        // Let the watcher arm its ticker before moving the clock.
        tokio::task::yield_now().await;

        // The tick is due and the stop lands before the watcher runs again.
        tokio::time::advance(INTERVAL).await;
        reg.stop(&key("a@neu.edu")).await.unwrap();

        after_ticks(3).await;
        assert_eq!(checker.calls(), 0);
        assert!(notifier.sent().is_empty());
        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_check_waits_one_interval() {
        let checker = ScriptedChecker::always(0);
        let reg = registry(checker.clone(), Arc::default());

        reg.start(key("a@neu.edu"), target("30001")).await.unwrap();
        tokio::time::sleep(INTERVAL - Duration::from_secs(1)).await;
        assert_eq!(checker.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_positive_count_notifies_once_per_tick() {
        let checker = ScriptedChecker::new(vec![Ok(5)], 0);
        let notifier = Arc::new(RecordingNotifier::default());
        let reg = registry(checker.clone(), notifier.clone());

        reg.start(key("a@neu.edu"), target("30001")).await.unwrap();
        after_ticks(1).await;
        assert_eq!(notifier.sent(), vec![("a@neu.edu".to_string(), 5, "30001".to_string())]);

        // Later ticks report zero seats: nothing more is sent.
        after_ticks(2).await;
        assert_eq!(checker.calls(), 3);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_or_negative_count_sends_nothing() {
        let checker = ScriptedChecker::new(vec![Ok(0), Ok(-3)], 0);
        let notifier = Arc::new(RecordingNotifier::default());
        let reg = registry(checker.clone(), notifier.clone());

        reg.start(key("a@neu.edu"), target("30001")).await.unwrap();
        after_ticks(2).await;
        assert_eq!(checker.calls(), 2);
        assert!(notifier.sent().is_empty());
        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_checker_failure_frees_key() {
        let checker = ScriptedChecker::new(vec![Err("connection reset".into())], 0);
        let reg = registry(checker.clone(), Arc::default());

        reg.start(key("a@neu.edu"), target("30001")).await.unwrap();
        after_ticks(1).await;
        assert_eq!(checker.calls(), 1);
        assert_eq!(
            reg.stop(&key("a@neu.edu")).await,
            Err(RegistryError::NotFound(key("a@neu.edu")))
        );

        // The dead watcher polls no more, and the key can be reused.
        after_ticks(3).await;
        assert_eq!(checker.calls(), 1);
        assert!(reg.start(key("a@neu.edu"), target("30001")).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notifier_failure_keeps_watching() {
        let checker = ScriptedChecker::always(3);
        let notifier = RecordingNotifier::failing();
        let reg = registry(checker.clone(), notifier.clone());

        reg.start(key("a@neu.edu"), target("30001")).await.unwrap();
        after_ticks(2).await;
        assert_eq!(checker.calls(), 2);
        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 2);
        assert!(matches!(reg.status(&key("a@neu.edu")).await, WatchStatus::Running(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_watcher_does_not_evict_new_subscription() {
        let checker = ScriptedChecker::always(0);
        let reg = registry(checker.clone(), Arc::default());

        reg.start(key("a@neu.edu"), target("30001")).await.unwrap();
        reg.stop(&key("a@neu.edu")).await.unwrap();
        let id = reg.start(key("a@neu.edu"), target("30002")).await.unwrap();

        // Let the first watcher observe its cancellation and exit.
        tokio::task::yield_now().await;
        after_ticks(1).await;

        match reg.status(&key("a@neu.edu")).await {
            WatchStatus::Running(info) => {
                assert_eq!(info.id, id);
                assert_eq!(info.target.crn, "30002");
            }
            WatchStatus::NotFound => panic!("new subscription was evicted"),
        }
        assert_eq!(checker.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_keys() {
        let checker = ScriptedChecker::always(1);
        let notifier = Arc::new(RecordingNotifier::default());
        let reg = registry(checker.clone(), notifier.clone());

        reg.start(key("a@neu.edu"), target("30001")).await.unwrap();
        reg.start(key("b@neu.edu"), target("30002")).await.unwrap();
        reg.stop(&key("a@neu.edu")).await.unwrap();

        after_ticks(1).await;
        assert_eq!(notifier.sent(), vec![("b@neu.edu".to_string(), 1, "30002".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_all() {
        let checker = ScriptedChecker::always(0);
        let reg = registry(checker.clone(), Arc::default());

        for (i, email) in ["a@neu.edu", "b@neu.edu", "c@neu.edu"].iter().enumerate() {
            reg.start(key(email), target(&format!("3000{i}"))).await.unwrap();
        }
        assert_eq!(reg.shutdown().await, 3);
        assert_eq!(reg.active_count().await, 0);

        after_ticks(2).await;
        assert_eq!(checker.calls(), 0);
        assert_eq!(reg.shutdown().await, 0);
    }

    #[tokio::test]
    async fn test_list_sorted_by_key() {
        let reg = registry(ScriptedChecker::always(0), Arc::default());
        reg.start(key("zed@neu.edu"), target("30002")).await.unwrap();
        reg.start(key("amy@neu.edu"), target("30001")).await.unwrap();

        let keys: Vec<_> = reg.list().await.into_iter().map(|i| i.key.to_string()).collect();
        assert_eq!(keys, vec!["amy@neu.edu", "zed@neu.edu"]);
        reg.shutdown().await;
    }
}
