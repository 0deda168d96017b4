//! Dry-run notifier: logs the notice instead of delivering it.

use async_trait::async_trait;
use seatwatch_core::error::Result;
use seatwatch_core::traits::Notifier;
use seatwatch_core::types::{SubscriberKey, WatchTarget};

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, key: &SubscriberKey, available: i64, target: &WatchTarget) -> Result<()> {
        tracing::info!("📢 [dry-run] {key}: {available} seat(s) available for {target}");
        Ok(())
    }
}
