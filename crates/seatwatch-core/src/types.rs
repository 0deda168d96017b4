//! Subscription data model.

use std::fmt;
use std::time::Duration;

use crate::error::{Result, SeatWatchError};

/// Registry-unique id of one subscription. Increases monotonically, so a
/// re-subscription for the same key always gets a fresh id.
pub type SubscriptionId = u64;

/// Identifies one subscriber (an email address). Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberKey(String);

impl SubscriberKey {
    /// Build a key from caller input. Surrounding whitespace is trimmed and
    /// an empty result is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SeatWatchError::InvalidKey(
                "subscriber key must not be empty".into(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for SubscriberKey {
    type Error = SeatWatchError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

/// The resource being polled for one watch: a course reference number
/// plus the polling parameters. Immutable once the watch starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    /// Course reference number.
    pub crn: String,
    /// Academic term code sent alongside the CRN.
    pub term: String,
    /// Time between two availability checks.
    pub poll_interval: Duration,
}

impl WatchTarget {
    pub fn new(crn: impl Into<String>, term: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            crn: crn.into(),
            term: term.into(),
            poll_interval,
        }
    }
}

impl fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CRN {} (term {})", self.crn, self.term)
    }
}
