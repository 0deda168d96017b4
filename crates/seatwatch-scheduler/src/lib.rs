//! # SeatWatch Scheduler
//!
//! Subscription lifecycle manager: one polling task per subscriber key.
//!
//! ## Architecture
//! ```text
//! SubscriptionRegistry (HashMap<key, Subscription> behind one Mutex)
//!   ├── start(key, target) → insert + spawn Watcher
//!   ├── stop(key)          → remove + fire CancelHandle
//!   └── Watcher (tokio task, one per key)
//!         ├── every poll_interval → AvailabilityChecker::check
//!         │     ├── count > 0 → Notifier::notify (failure logged)
//!         │     └── error     → deregister + exit
//!         └── on cancel       → deregister + exit
//! ```

pub mod cancel;
pub mod registry;
pub mod watcher;

pub use cancel::{CancelHandle, Cancelled, cancellation};
pub use registry::{SubscriptionInfo, SubscriptionRegistry, WatchStatus};
