//! Collaborator traits: the seams between the scheduler and the outside
//! world. Implementations must be reentrant: one instance is shared by
//! every running watch.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{SubscriberKey, WatchTarget};

/// Reports how many units of a target are currently available.
#[async_trait]
pub trait AvailabilityChecker: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Current number of open seats. Zero or negative means unavailable.
    async fn check(&self, target: &WatchTarget) -> Result<i64>;
}

/// Delivers an availability notice to a subscriber. Best effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, key: &SubscriberKey, available: i64, target: &WatchTarget)
    -> Result<()>;
}
