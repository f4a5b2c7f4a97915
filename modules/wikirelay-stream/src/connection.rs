//! Stream reconnection policy: exponential backoff that resets after a
//! sustained healthy connection.

use std::time::Duration;

use tracing::debug;

/// Delay before the first reconnect attempt.
pub const BASE_DELAY: Duration = Duration::from_secs(5);

/// Uptime after which a connection counts as stable and the delay resets.
pub const STABLE_AFTER: Duration = Duration::from_secs(60);

/// Tracks the backoff delay across reconnect attempts.
///
/// The delay doubles on every failure with no upper cap. A connection that
/// stayed up for at least [`STABLE_AFTER`] resets the delay to base, so a
/// link that recovers stops paying for old failures while a tight
/// connect-crash loop keeps backing off.
#[derive(Debug)]
pub struct ReconnectPolicy {
    current: Duration,
}

impl ReconnectPolicy {
    pub fn new() -> Self {
        Self {
            current: BASE_DELAY,
        }
    }

    /// Delay to wait before the next attempt. Doubles the stored delay.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2);
        delay
    }

    /// Record how long the last connection stayed up.
    pub fn connection_closed(&mut self, uptime: Duration) {
        if uptime >= STABLE_AFTER {
            debug!(
                uptime_secs = uptime.as_secs(),
                "Stable connection, resetting backoff"
            );
            self.current = BASE_DELAY;
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new()
    }
}
