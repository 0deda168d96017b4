//! Watcher: the polling loop behind one subscription.
//!
//! Wakes on whichever comes first: the poll interval or the cancellation
//! signal (cancellation wins a tie). A checker failure ends the watch; a
//! notifier failure is only logged. On every exit path the watcher removes
//! its own registry entry, unless a newer subscription has replaced it.

use std::sync::Arc;
use std::time::Duration;

use seatwatch_core::error::Result;
use seatwatch_core::traits::{AvailabilityChecker, Notifier};
use seatwatch_core::types::{SubscriberKey, SubscriptionId, WatchTarget};
use tokio::time::{Instant, MissedTickBehavior};

use crate::cancel::Cancelled;
use crate::registry::SharedSubscriptions;

/// Lower bound on the poll interval; `tokio::time::interval` rejects zero.
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub(crate) struct Watcher {
    pub(crate) id: SubscriptionId,
    pub(crate) key: SubscriberKey,
    pub(crate) target: WatchTarget,
    pub(crate) checker: Arc<dyn AvailabilityChecker>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) subscriptions: SharedSubscriptions,
}

impl Watcher {
    /// Run until cancelled or the checker fails.
    pub(crate) async fn run(self, mut cancelled: Cancelled) {
        let period = self.target.poll_interval.max(MIN_POLL_INTERVAL);
        // First check one full interval after the watch starts.
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "👀 Watching {} for {} (every {}s)",
            self.target,
            self.key,
            period.as_secs()
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut cancelled => {
                    tracing::info!("🛑 Stopping course check for {}", self.key);
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        tracing::error!(
                            "❌ Check for {} ({}) failed, abandoning watch: {e}",
                            self.key,
                            self.target
                        );
                        break;
                    }
                }
            }
        }

        self.deregister().await;
    }

    /// One tick: query availability, notify on a positive count.
    /// Only checker errors are returned.
    async fn poll_once(&self) -> Result<()> {
        let available = self.checker.check(&self.target).await?;
        if available <= 0 {
            tracing::debug!("{}: no seats for {}", self.target, self.key);
            return Ok(());
        }

        tracing::info!(
            "🎯 {} seat(s) open for {}, notifying {}",
            available,
            self.target,
            self.key
        );
        match self.notifier.notify(&self.key, available, &self.target).await {
            Ok(()) => tracing::info!("✅ Notified {} via {}", self.key, self.notifier.name()),
            Err(e) => tracing::warn!(
                "⚠️ {} notification to {} failed, will retry next tick: {e}",
                self.notifier.name(),
                self.key
            ),
        }
        Ok(())
    }

    /// Remove this watcher's entry. A no-op when `stop` already removed it
    /// or the key now belongs to a newer subscription.
    async fn deregister(&self) {
        let mut subs = self.subscriptions.lock().await;
        if subs.get(&self.key).is_some_and(|s| s.id == self.id) {
            subs.remove(&self.key);
            tracing::debug!("Deregistered subscription #{} for {}", self.id, self.key);
        }
    }
}
