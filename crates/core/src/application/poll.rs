// Bounded polling

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use super::constants::DEFAULT_POLL_INTERVAL;

/// How often to poll and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` waits forever
    pub max_wait: Option<Duration>,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_wait: Option<Duration>) -> Self {
        Self { interval, max_wait }
    }

    /// Poll every `interval` for at most `max_wait`
    pub fn bounded(interval: Duration, max_wait: Duration) -> Self {
        Self::new(interval, Some(max_wait))
    }

    /// Poll every `interval` until done
    pub fn unbounded(interval: Duration) -> Self {
        Self::new(interval, None)
    }

    /// Poll every `interval` for at most `polls` queries.
    pub fn with_max_polls(interval: Duration, polls: u32) -> Self {
        Self::bounded(interval, interval * polls.saturating_sub(1))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::unbounded(DEFAULT_POLL_INTERVAL)
    }
}

/// Result of a poll loop that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// The readiness predicate was satisfied
    Ready(T),
    /// `max_wait` elapsed first; `last` is the final value fetched
    TimedOut { last: T, waited: Duration },
}

/// Repeatedly `fetch` a value until `is_ready` accepts it or the policy's
/// maximum wait elapses.
///
/// The value is always fetched at least once. The timeout is checked after
/// each fetch, so a value that becomes ready on the final fetch is still
/// reported as `Ready`. A fetch error stops polling and is returned as-is.
///
/// # Example
/// ```text
/// let outcome = poll_until(&policy, || probe.instance_status(id), |s| s.phase.is_terminal()).await?;
/// ```
pub async fn poll_until<T, E, F, Fut, P>(
    policy: &PollPolicy,
    mut fetch: F,
    is_ready: P,
) -> Result<PollOutcome<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&T) -> bool,
{
    let started = Instant::now();
    loop {
        let value = fetch().await?;
        if is_ready(&value) {
            return Ok(PollOutcome::Ready(value));
        }

        let waited = started.elapsed();
        if let Some(max_wait) = policy.max_wait {
            if waited >= max_wait {
                return Ok(PollOutcome::TimedOut { last: value, waited });
            }
        }

        sleep(policy.interval).await;
    }
}
