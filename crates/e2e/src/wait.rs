//! Bounded polling and the autosave readiness wait
//!
//! Edit pages persist changes in the background and mark the `.autosave`
//! form with `data-is-busy` while a save is in flight. Any interaction that
//! triggers a save has to be followed by [`wait_until_ready`] before the
//! next interaction, otherwise the next action races the save.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{E2eError, E2eResult};

/// Default bound for readiness and element waits.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default delay between two evaluations of a condition.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Something that can report whether an asynchronous save is in flight.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Returns `true` while a save is in flight.
    ///
    /// Implementations must report `false` when the marker element is
    /// missing from the document instead of failing.
    async fn is_busy(&self) -> E2eResult<bool>;
}

/// Timing for a bounded poll
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub interval: Duration,
}

impl WaitOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Evaluate `condition` until it returns `true` or `options.timeout` elapses.
///
/// The condition is always evaluated at least once, so an already satisfied
/// condition returns without sleeping. Errors from the condition abort the
/// poll immediately.
pub async fn poll_until<F, Fut>(what: &str, options: WaitOptions, mut condition: F) -> E2eResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<bool>>,
{
    let start = Instant::now();
    let mut attempts = 0usize;

    loop {
        attempts += 1;
        if condition().await? {
            if attempts > 1 {
                debug!("{} satisfied after {} polls ({:?})", what, attempts, start.elapsed());
            }
            return Ok(());
        }

        if start.elapsed() >= options.timeout {
            return Err(E2eError::timeout(what, options.timeout));
        }

        sleep(options.interval).await;
    }
}

/// Block until `probe` stops reporting busy, failing with
/// [`E2eError::Timeout`] once `timeout` has elapsed.
pub async fn wait_until_ready<P>(probe: &P, timeout: Duration) -> E2eResult<()>
where
    P: ReadinessProbe + ?Sized,
{
    poll_until("autosave to finish", WaitOptions::with_timeout(timeout), move || async move {
        probe.is_busy().await.map(|busy| !busy)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reports busy for the first `busy_polls` evaluations.
    struct CountdownProbe {
        busy_polls: usize,
        calls: AtomicUsize,
    }

    impl CountdownProbe {
        fn new(busy_polls: usize) -> Self {
            Self {
                busy_polls,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReadinessProbe for CountdownProbe {
        async fn is_busy(&self) -> E2eResult<bool> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(n < self.busy_polls)
        }
    }

    struct BrokenProbe;

    #[async_trait]
    impl ReadinessProbe for BrokenProbe {
        async fn is_busy(&self) -> E2eResult<bool> {
            Err(E2eError::NotFound("document".to_string()))
        }
    }

    #[tokio::test]
    async fn test_ready_probe_returns_after_one_poll() {
        let probe = CountdownProbe::new(0);
        wait_until_ready(&probe, Duration::from_secs(1)).await.unwrap();
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn test_waits_for_busy_to_clear() {
        let probe = CountdownProbe::new(3);
        wait_until_ready(&probe, Duration::from_secs(5)).await.unwrap();
        assert_eq!(probe.calls(), 4);
    }

    #[tokio::test]
    async fn test_never_clearing_probe_times_out() {
        let probe = CountdownProbe::new(usize::MAX);
        let start = std::time::Instant::now();

        let err = wait_until_ready(&probe, Duration::from_millis(300))
            .await
            .unwrap_err();

        assert!(err.is_timeout(), "unexpected error: {err}");
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_probe_errors_are_not_retried() {
        let err = wait_until_ready(&BrokenProbe, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, E2eError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_poll_until_respects_interval() {
        let calls = AtomicUsize::new(0);
        let options = WaitOptions {
            timeout: Duration::from_millis(250),
            interval: Duration::from_millis(100),
        };

        let result = poll_until("nothing", options, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, E2eError>(false)
        })
        .await;

        assert!(result.unwrap_err().is_timeout());
        // t=0, 100, 200, 300ms
        let n = calls.load(Ordering::SeqCst);
        assert!((3..=5).contains(&n), "polled {n} times");
    }

    #[test]
    fn test_default_options() {
        let options = WaitOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert!(options.interval < options.timeout);
    }
}
