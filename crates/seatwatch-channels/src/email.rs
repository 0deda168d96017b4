//! Email notifier: tells a subscriber over SMTP (async lettre, STARTTLS)
//! that seats have opened up.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use seatwatch_core::config::NotifierConfig;
use seatwatch_core::error::{Result, SeatWatchError};
use seatwatch_core::traits::Notifier;
use seatwatch_core::types::{SubscriberKey, WatchTarget};

pub const SUBJECT: &str = "Course Slot Available";

/// Plain-text body of the availability notice.
pub fn notification_body(available: i64, crn: &str) -> String {
    format!(
        "A slot is available. There are {available} seats available for you subscribe course: {crn}"
    )
}

/// Build the notice for `to`. Fails on an unparseable recipient address.
pub fn build_message(from: &Mailbox, to: &str, available: i64, target: &WatchTarget) -> Result<Message> {
    let to_mailbox: Mailbox = to
        .parse()
        .map_err(|e| SeatWatchError::Notifier(format!("Invalid to: {e}")))?;

    Message::builder()
        .from(from.clone())
        .to(to_mailbox)
        .subject(SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(notification_body(available, &target.crn))
        .map_err(|e| SeatWatchError::Notifier(format!("Build email: {e}")))
}

/// Sends availability notices from one configured account.
pub struct SmtpNotifier {
    from: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    /// Set up the transport. No connection is made until the first send.
    pub fn new(config: &NotifierConfig) -> Result<Self> {
        let from: Mailbox = format!("{} <{}>", config.display_name, config.from)
            .parse()
            .map_err(|e| SeatWatchError::Config(format!("Invalid notifier.from: {e}")))?;

        let creds = Credentials::new(config.from.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| SeatWatchError::Config(format!("SMTP relay: {e}")))?
            .port(config.smtp_port)
            .credentials(creds)
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        Ok(Self { from, mailer })
    }

    pub fn sender(&self) -> &Mailbox {
        &self.from
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn notify(&self, key: &SubscriberKey, available: i64, target: &WatchTarget) -> Result<()> {
        let email = build_message(&self.from, key.as_str(), available, target)?;
        self.mailer
            .send(email)
            .await
            .map_err(|e| SeatWatchError::Notifier(format!("SMTP send: {e}")))?;

        tracing::info!("📤 Send Notification to {key} Successfully");
        Ok(())
    }
}
