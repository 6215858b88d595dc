use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use cashew_core::error::WalletError;

/// Result of polling a payment check.
#[derive(Clone, Debug)]
pub enum PollOutcome {
    Paid,
    /// Every check answered and none reported payment.
    NotPaid,
    /// The last check could not be answered.
    Failed(WalletError),
}

/// Run `check` up to `max_attempts` times, `interval` apart, until it
/// reports payment.
///
/// A failed check does not stop polling; if the final attempt fails its
/// error is returned so callers can tell "not paid yet" from "could not
/// check".
pub async fn poll_until_paid<F, Fut>(
    mut check: F,
    interval: Duration,
    max_attempts: u32,
) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, WalletError>>,
{
    let mut last = PollOutcome::NotPaid;

    for attempt in 1..=max_attempts {
        match check().await {
            Ok(true) => {
                debug!(attempt, "payment confirmed");
                return PollOutcome::Paid;
            }
            Ok(false) => last = PollOutcome::NotPaid,
            Err(err) => {
                warn!(attempt, error = %err, "payment check failed");
                last = PollOutcome::Failed(err);
            }
        }
        if attempt < max_attempts {
            tokio::time::sleep(interval).await;
        }
    }

    last
}
