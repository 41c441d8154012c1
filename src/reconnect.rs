//! Reconnection policy for dropped store connections.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

/// Default delay between reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Strategy for re-establishing a connection after it was lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// No automatic reconnection.
    None,

    /// Fixed delay between attempts.
    Fixed {
        /// Delay between attempts.
        delay: Duration,
        /// Maximum number of attempts (None = infinite).
        max_attempts: Option<u32>,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}

impl ReconnectPolicy {
    /// Fixed delay, unbounded attempts.
    pub fn fixed(delay: Duration) -> Self {
        Self::Fixed {
            delay,
            max_attempts: None,
        }
    }

    /// Fixed delay, giving up after `max_attempts` failures.
    pub fn fixed_with_max(delay: Duration, max_attempts: u32) -> Self {
        Self::Fixed {
            delay,
            max_attempts: Some(max_attempts),
        }
    }

    /// Delay to wait before attempt number `attempt` (zero-based).
    ///
    /// Returns `None` once the policy has given up.
    pub fn calculate_delay(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Fixed {
                delay,
                max_attempts,
            } => {
                if let Some(max) = max_attempts {
                    if attempt >= *max {
                        return None;
                    }
                }
                Some(*delay)
            }
        }
    }
}

/// Run `connect` until it succeeds or the policy gives up.
///
/// Sleeps go through `tokio::time`, so a paused runtime drives them on
/// virtual time.
pub async fn retry<T, E, F, Fut>(policy: &ReconnectPolicy, mut connect: F) -> Option<T>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;
    loop {
        let delay = policy.calculate_delay(attempt)?;
        tokio::time::sleep(delay).await;

        match connect().await {
            Ok(value) => {
                info!(attempt = attempt + 1, "Reconnected");
                return Some(value);
            }
            Err(e) => {
                warn!(attempt = attempt + 1, error = %e, "Reconnect attempt failed");
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    #[test]
    fn default_is_fixed_one_second_unbounded() {
        assert_eq!(
            ReconnectPolicy::default(),
            ReconnectPolicy::Fixed {
                delay: Duration::from_millis(1000),
                max_attempts: None,
            }
        );
    }

    #[test]
    fn fixed_never_gives_up() {
        let policy = ReconnectPolicy::fixed(Duration::from_secs(1));
        assert_eq!(policy.calculate_delay(0), Some(Duration::from_secs(1)));
        assert_eq!(policy.calculate_delay(10_000), Some(Duration::from_secs(1)));
    }

    #[test]
    fn fixed_with_max_stops() {
        let policy = ReconnectPolicy::fixed_with_max(Duration::from_millis(10), 2);
        assert!(policy.calculate_delay(1).is_some());
        assert!(policy.calculate_delay(2).is_none());
    }

    #[test]
    fn none_never_retries() {
        assert!(ReconnectPolicy::None.calculate_delay(0).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_waits_fixed_delay_between_attempts() {
        let attempts = Arc::new(AtomicU32::new(0));
        let policy = ReconnectPolicy::fixed(Duration::from_millis(1000));
        let start = Instant::now();

        let counter = Arc::clone(&attempts);
        let result = retry(&policy, || {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 4 { Err(format!("refused #{n}")) } else { Ok(n) }
            }
        })
        .await;

        assert_eq!(result, Some(4));
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(4000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(4100), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn retry_gives_up_when_policy_exhausted() {
        let policy = ReconnectPolicy::fixed_with_max(Duration::from_millis(500), 3);
        let start = Instant::now();

        let result: Option<()> = retry(&policy, || async { Err::<(), _>("down") }).await;

        assert!(result.is_none());
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }
}
