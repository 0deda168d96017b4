//! # SeatWatch Core
//!
//! Shared building blocks for the SeatWatch workspace: configuration,
//! error types, the subscription data model, and the two collaborator
//! traits the scheduler depends on.
//!
//! ```text
//! SubscriptionRegistry (seatwatch-scheduler)
//!   └── Watcher task per SubscriberKey
//!         ├── AvailabilityChecker::check(target) → seat count
//!         └── Notifier::notify(key, count, target)
//! ```

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::SeatWatchConfig;
pub use error::{RegistryError, Result, SeatWatchError};
pub use traits::{AvailabilityChecker, Notifier};
pub use types::{SubscriberKey, SubscriptionId, WatchTarget};
