//! Banner enrollment checker: asks the Student Registration SSB how many
//! seats a CRN has left.
//!
//! The endpoint answers a form POST (`term`, `courseReferenceNumber`) with
//! an HTML fragment; the seat count is scraped out of it.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use seatwatch_core::config::CheckerConfig;
use seatwatch_core::error::{Result, SeatWatchError};
use seatwatch_core::traits::AvailabilityChecker;
use seatwatch_core::types::WatchTarget;

static SEATS_AVAILABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"Enrollment Seats Available:</span> <span dir="ltr"> (-?\d+) </span>"#)
        .expect("seat count pattern is valid")
});

/// Extract the available seat count from an enrollment-info fragment.
pub fn parse_available_seats(html: &str) -> Result<i64> {
    let caps = SEATS_AVAILABLE.captures(html).ok_or_else(|| {
        SeatWatchError::Checker("could not find available seats in HTML".into())
    })?;
    caps[1]
        .parse::<i64>()
        .map_err(|e| SeatWatchError::Checker(format!("invalid seat count '{}': {e}", &caps[1])))
}

/// Checks seat availability against a Banner `getEnrollmentInfo` endpoint.
pub struct BannerChecker {
    client: reqwest::Client,
    endpoint: String,
}

impl BannerChecker {
    pub fn new(config: &CheckerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AvailabilityChecker for BannerChecker {
    fn name(&self) -> &str {
        "banner"
    }

    async fn check(&self, target: &WatchTarget) -> Result<i64> {
        let resp = self
            .client
            .post(&self.endpoint)
            .form(&[
                ("term", target.term.as_str()),
                ("courseReferenceNumber", target.crn.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SeatWatchError::Checker(format!(
                "enrollment endpoint returned {status} for CRN {}",
                target.crn
            )));
        }

        let body = resp.text().await?;
        let seats = parse_available_seats(&body)?;
        tracing::debug!("🔎 {target}: {seats} seat(s) available");
        Ok(seats)
    }
}
