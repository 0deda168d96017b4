//! Error types shared across the workspace.

use thiserror::Error;

use crate::types::SubscriberKey;

/// Errors raised by collaborators, configuration and input parsing.
#[derive(Debug, Error)]
pub enum SeatWatchError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Availability check failed: {0}")]
    Checker(String),

    #[error("Notification failed: {0}")]
    Notifier(String),

    #[error("Invalid subscriber key: {0}")]
    InvalidKey(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Outcome of a rejected registry operation. Both variants are
/// recoverable and map to client errors at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("A check is already running for {0}")]
    AlreadyActive(SubscriberKey),

    #[error("No active check found for {0}")]
    NotFound(SubscriberKey),
}

pub type Result<T> = std::result::Result<T, SeatWatchError>;
