use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::token::ports::TokenRepository;
use crate::domain::token::store::TokenStore;

/// Periodically purges expired tokens.
pub struct TokenReaper<TR>
where
    TR: TokenRepository,
{
    store: Arc<TokenStore<TR>>,
    period: Duration,
    cycle_timeout: Duration,
}

impl<TR> TokenReaper<TR>
where
    TR: TokenRepository,
{
    const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a reaper running one cycle per `period`.
    pub fn new(store: Arc<TokenStore<TR>>, period: Duration) -> Self {
        Self {
            store,
            period,
            cycle_timeout: Self::DEFAULT_CYCLE_TIMEOUT,
        }
    }

    /// Run until `cancel` fires.
    ///
    /// Each cycle deletes expired tokens, then sleeps until one period after
    /// the cycle started. Failures are logged and the next cycle still runs.
    /// Cancellation is observed during the sleep as well as between cycles.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(period_secs = self.period.as_secs(), "Token reaper started");

        while !cancel.is_cancelled() {
            let started = Instant::now();

            match tokio::time::timeout(self.cycle_timeout, self.store.delete_expired()).await {
                Ok(Ok(deleted)) => {
                    tracing::debug!(deleted, "Expired tokens deleted");
                }
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Failed to delete expired tokens");
                }
                Err(_) => {
                    tracing::error!(
                        timeout_secs = self.cycle_timeout.as_secs(),
                        "Deleting expired tokens timed out"
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep_until(started + self.period) => {}
            }
        }

        tracing::info!("Token reaper stopped");
    }
}
