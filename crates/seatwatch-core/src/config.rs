//! SeatWatch configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SeatWatchError};
use crate::types::WatchTarget;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeatWatchConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub checker: CheckerConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl SeatWatchConfig {
    /// Load config from the default path (~/.seatwatch/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SeatWatchError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    /// Parse config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SeatWatchError::Config(format!("Failed to parse config: {e}")))
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the SeatWatch home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".seatwatch")
    }

    /// Apply `SEATWATCH_*` environment overrides (secrets stay out of files).
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(from) = non_empty("SEATWATCH_SMTP_FROM") {
            self.notifier.from = from;
        }
        if let Some(password) = non_empty("SEATWATCH_SMTP_PASSWORD") {
            self.notifier.password = password;
        }
        if let Some(term) = non_empty("SEATWATCH_TERM") {
            self.watch.term = term;
        }
    }

    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.watch.poll_interval_secs == 0 {
            return Err(SeatWatchError::Config(
                "watch.poll_interval_secs must be greater than zero".into(),
            ));
        }
        if self.watch.term.trim().is_empty() {
            return Err(SeatWatchError::Config("watch.term must not be empty".into()));
        }
        if self.notifier.kind == NotifierKind::Smtp && self.notifier.from.trim().is_empty() {
            return Err(SeatWatchError::Config(
                "notifier.from is required for the smtp notifier (or set SEATWATCH_SMTP_FROM)"
                    .into(),
            ));
        }
        Ok(())
    }

    /// Build the watch target for a CRN using the configured term and interval.
    pub fn target_for(&self, crn: &str) -> WatchTarget {
        WatchTarget::new(crn.trim(), self.watch.term.clone(), self.watch.poll_interval())
    }
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 { 8080 }
fn default_host() -> String { "0.0.0.0".into() }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Polling parameters shared by every watch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_term")]
    pub term: String,
}

fn default_poll_interval() -> u64 { 60 }
fn default_term() -> String { "202430".into() }

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            term: default_term(),
        }
    }
}

/// Enrollment endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://nubanner.neu.edu/StudentRegistrationSsb/ssb/searchResults/getEnrollmentInfo".into()
}
fn default_timeout() -> u64 { 30 }

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Which notifier delivers availability notices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Smtp,
    /// Log the notice instead of sending it.
    Log,
}

/// SMTP notifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub kind: NotifierKind,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_display_name")]
    pub display_name: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_smtp_host() -> String { "smtp.gmail.com".into() }
fn default_smtp_port() -> u16 { 587 }
fn default_display_name() -> String { "SeatWatch".into() }

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::default(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            from: String::new(),
            password: String::new(),
            display_name: default_display_name(),
            timeout_secs: default_timeout(),
        }
    }
}
