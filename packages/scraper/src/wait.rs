//! Bounded polling waits.
//!
//! A wait probes a condition at least once, then every poll interval until
//! the condition yields a value or the timeout elapses. Running out of time
//! is an ordinary outcome (`Ok(None)`); only backend failures are errors.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::browser::{Browser, BrowserError, Element};

/// How long to wait for a condition and how often to re-check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Total time budget, measured from the first probe.
    pub timeout: Duration,
    /// Pause between probes.
    pub poll_interval: Duration,
}

impl WaitPolicy {
    /// Creates a policy with the given timeout and poll interval.
    #[must_use]
    pub const fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// A policy that probes exactly once.
    #[must_use]
    pub const fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }
}

/// Probes until `probe` yields `Some` or the policy's timeout elapses.
///
/// # Errors
///
/// Returns the first [`BrowserError`] raised by `probe`.
pub async fn poll_until<T, F, Fut>(policy: WaitPolicy, mut probe: F) -> Result<Option<T>, BrowserError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, BrowserError>>,
{
    let deadline = Instant::now() + policy.timeout;

    loop {
        if let Some(value) = probe().await? {
            return Ok(Some(value));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }

        tokio::time::sleep(policy.poll_interval.min(deadline - now)).await;
    }
}

/// Waits for at least one element matching `selector` to be present.
///
/// Returns every match found by the successful probe.
///
/// # Errors
///
/// Returns [`BrowserError`] if a lookup fails.
pub async fn wait_for_elements<B: Browser>(
    browser: &B,
    selector: &str,
    policy: WaitPolicy,
) -> Result<Option<Vec<B::Element>>, BrowserError> {
    poll_until(policy, move || async move {
        let found = browser.find_all(selector).await?;
        Ok((!found.is_empty()).then_some(found))
    })
    .await
}

/// Waits for an element matching `selector` that can be clicked.
///
/// # Errors
///
/// Returns [`BrowserError`] if a lookup fails.
pub async fn wait_for_clickable<B: Browser>(
    browser: &B,
    selector: &str,
    policy: WaitPolicy,
) -> Result<Option<B::Element>, BrowserError> {
    poll_until(policy, move || async move {
        for element in browser.find_all(selector).await? {
            if element.is_clickable().await? {
                return Ok(Some(element));
            }
        }
        Ok(None)
    })
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn returns_first_value_without_waiting() {
        let start = Instant::now();
        let policy = WaitPolicy::new(Duration::from_secs(10), Duration::from_millis(500));
        let found = poll_until(policy, || async { Ok(Some(7)) }).await.unwrap();
        assert_eq!(found, Some(7));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_as_none_after_budget() {
        let probes = AtomicU32::new(0);
        let start = Instant::now();
        let found: Option<()> = poll_until(
            WaitPolicy::new(Duration::from_secs(5), Duration::from_millis(500)),
            || {
                probes.fetch_add(1, Ordering::SeqCst);
                async { Ok(None) }
            },
        )
        .await
        .unwrap();
        assert_eq!(found, None);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        // One probe at t=0 and one per interval up to and including the deadline.
        assert_eq!(probes.load(Ordering::SeqCst), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_once_condition_appears() {
        let probes = AtomicU32::new(0);
        let found = poll_until(
            WaitPolicy::new(Duration::from_secs(5), Duration::from_millis(500)),
            || {
                let n = probes.fetch_add(1, Ordering::SeqCst);
                async move { Ok((n >= 3).then_some(n)) }
            },
        )
        .await
        .unwrap();
        assert_eq!(found, Some(3));
    }

    #[tokio::test]
    async fn immediate_policy_probes_once() {
        let probes = AtomicU32::new(0);
        let found: Option<()> = poll_until(WaitPolicy::immediate(), || {
            probes.fetch_add(1, Ordering::SeqCst);
            async { Ok(None) }
        })
        .await
        .unwrap();
        assert_eq!(found, None);
        assert_eq!(probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn propagates_backend_errors() {
        let result: Result<Option<()>, _> =
            poll_until(WaitPolicy::immediate(), || async { Err(BrowserError::NoPage) }).await;
        assert!(matches!(result, Err(BrowserError::NoPage)));
    }
}
