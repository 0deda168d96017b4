//! Collaborator implementations: where seat counts come from and how
//! subscribers hear about them.

pub mod banner;
pub mod dry_run;
pub mod email;

use std::sync::Arc;

use seatwatch_core::config::{NotifierConfig, NotifierKind};
use seatwatch_core::error::Result;
use seatwatch_core::traits::Notifier;

pub use banner::BannerChecker;
pub use dry_run::LogNotifier;
pub use email::SmtpNotifier;

/// Build the notifier selected by configuration.
pub fn notifier_from_config(config: &NotifierConfig) -> Result<Arc<dyn Notifier>> {
    match config.kind {
        NotifierKind::Smtp => Ok(Arc::new(SmtpNotifier::new(config)?)),
        NotifierKind::Log => Ok(Arc::new(LogNotifier)),
    }
}
