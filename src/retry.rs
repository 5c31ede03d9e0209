use crate::error::{BetfairError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// `None` leaves the call deadline as the only bound.
    pub max_attempts: Option<u32>,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

/// What a single attempt produced, stripped of client-specific detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// DNS, TCP or TLS failure; no response was received.
    ConnectionFailure,
    /// Some HTTP response arrived, whatever its status or body.
    ResponseReceived,
}

impl AttemptOutcome {
    pub fn of(err: &BetfairError) -> Self {
        if err.is_connection_failure() {
            AttemptOutcome::ConnectionFailure
        } else {
            AttemptOutcome::ResponseReceived
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    Fail,
}

#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Decide whether a failed attempt is tried again.
    ///
    /// `attempt` is 1-based. A fired deadline always fails, a received
    /// response is always terminal, and only connection failures retry.
    pub fn decide(
        &self,
        attempt: u32,
        now: Instant,
        deadline: Instant,
        outcome: AttemptOutcome,
    ) -> RetryDecision {
        if now >= deadline {
            return RetryDecision::Fail;
        }
        if outcome == AttemptOutcome::ResponseReceived {
            return RetryDecision::Fail;
        }
        if self.config.max_attempts.is_some_and(|max| attempt >= max) {
            return RetryDecision::Fail;
        }
        let remaining = deadline - now;
        RetryDecision::Retry(self.delay_for_attempt(attempt).min(remaining))
    }

    /// Backoff before attempt `attempt + 1`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let base =
            self.config.initial_delay.as_millis() as f64 * self.config.multiplier.powi(exponent);
        let capped = base.min(self.config.max_delay.as_millis() as f64);

        let millis = if self.config.jitter {
            // +/- 25% so concurrent callers spread out
            let spread = capped * 0.25;
            (capped + (rand::random::<f64>() - 0.5) * 2.0 * spread).max(0.0)
        } else {
            capped
        };
        Duration::from_millis(millis as u64)
    }

    /// Run `operation` until it succeeds, fails terminally, or `deadline` passes.
    pub async fn retry<F, Fut, T>(&self, deadline: Instant, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            if Instant::now() >= deadline {
                return Err(BetfairError::DeadlineExceeded { attempts: attempt });
            }
            attempt += 1;

            let result = match timeout_at(deadline, operation()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Attempt {} cut short by deadline", attempt);
                    return Err(BetfairError::DeadlineExceeded { attempts: attempt });
                }
            };

            let err = match result {
                Ok(value) => {
                    if attempt > 1 {
                        info!("Operation succeeded after {} attempts", attempt);
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            let outcome = AttemptOutcome::of(&err);
            match self.decide(attempt, Instant::now(), deadline, outcome) {
                RetryDecision::Retry(delay) => {
                    warn!(
                        "Attempt {} failed: {}. Retrying in {:?}...",
                        attempt, err, delay
                    );
                    sleep(delay).await;
                }
                RetryDecision::Fail
                    if outcome == AttemptOutcome::ConnectionFailure
                        && Instant::now() >= deadline =>
                {
                    warn!("Operation failed after {} attempts: {}", attempt, err);
                    return Err(BetfairError::DeadlineExceeded { attempts: attempt });
                }
                RetryDecision::Fail => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_attempts: None,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            multiplier: 2.0,
            jitter: false,
        })
    }

    /// A real connection-level reqwest error: nothing listens on port 1.
    async fn connection_error() -> BetfairError {
        match reqwest::Client::new().get("http://127.0.0.1:1/").send().await {
            Ok(_) => panic!("expected connection failure"),
            Err(err) => BetfairError::Transport(err),
        }
    }

    #[test]
    fn test_decide_never_retries_a_response() {
        let policy = fast_policy();
        let now = Instant::now();
        let decision = policy.decide(
            1,
            now,
            now + Duration::from_secs(10),
            AttemptOutcome::ResponseReceived,
        );
        assert_eq!(decision, RetryDecision::Fail);
    }

    #[test]
    fn test_decide_fails_once_deadline_fired() {
        let policy = fast_policy();
        let now = Instant::now();
        assert_eq!(
            policy.decide(1, now, now, AttemptOutcome::ConnectionFailure),
            RetryDecision::Fail
        );
    }

    #[test]
    fn test_decide_retries_connection_failure() {
        let policy = fast_policy();
        let now = Instant::now();
        assert_eq!(
            policy.decide(
                3,
                now,
                now + Duration::from_secs(10),
                AttemptOutcome::ConnectionFailure
            ),
            RetryDecision::Retry(Duration::from_millis(40))
        );
    }

    #[test]
    fn test_decide_clamps_delay_to_deadline() {
        let policy = fast_policy();
        let now = Instant::now();
        assert_eq!(
            policy.decide(
                5,
                now,
                now + Duration::from_millis(5),
                AttemptOutcome::ConnectionFailure
            ),
            RetryDecision::Retry(Duration::from_millis(5))
        );
    }

    #[test]
    fn test_decide_respects_max_attempts() {
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts: Some(2),
            ..fast_policy().config
        });
        let now = Instant::now();
        let deadline = now + Duration::from_secs(10);
        assert!(matches!(
            policy.decide(1, now, deadline, AttemptOutcome::ConnectionFailure),
            RetryDecision::Retry(_)
        ));
        assert_eq!(
            policy.decide(2, now, deadline, AttemptOutcome::ConnectionFailure),
            RetryDecision::Fail
        );
    }

    #[test]
    fn test_backoff_caps_at_max_delay() {
        let policy = fast_policy();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(10));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(20));
        assert_eq!(policy.delay_for_attempt(10), Duration::from_millis(50));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = RetryPolicy::new(RetryConfig {
            jitter: true,
            ..fast_policy().config
        });
        for _ in 0..50 {
            let delay = policy.delay_for_attempt(1);
            assert!(delay >= Duration::from_millis(7));
            assert!(delay <= Duration::from_millis(13));
        }
    }

    #[test]
    fn test_default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, None);
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert_eq!(config.multiplier, 2.0);
    }

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let policy = fast_policy();
        let deadline = Instant::now() + Duration::from_secs(5);
        let result = policy.retry(deadline, || async { Ok::<_, BetfairError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_recovers_after_connection_reset() {
        let counter = Arc::new(AtomicU32::new(0));
        let failure = Arc::new(tokio::sync::Mutex::new(Some(connection_error().await)));
        let policy = fast_policy();
        let deadline = Instant::now() + Duration::from_secs(5);

        let result = policy
            .retry(deadline, || {
                let counter = counter.clone();
                let failure = failure.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    match failure.lock().await.take() {
                        Some(err) => Err(err),
                        None => Ok("ok"),
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_remote_error_is_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let policy = fast_policy();
        let deadline = Instant::now() + Duration::from_secs(5);

        let result = policy
            .retry(deadline, || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(BetfairError::RemoteApi {
                        code: -32099,
                        message: "INVALID_SESSION".to_string(),
                        exception_code: None,
                    })
                }
            })
            .await;

        assert!(matches!(
            result,
            Err(BetfairError::RemoteApi { code: -32099, .. })
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_status_error_is_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let policy = fast_policy();
        let deadline = Instant::now() + Duration::from_secs(5);

        let result = policy
            .retry(deadline, || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(BetfairError::Status {
                        status: 503,
                        body: "unavailable".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(BetfairError::Status { status: 503, .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deadline_stops_further_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let failure = Arc::new(tokio::sync::Mutex::new(Some(connection_error().await)));
        let policy = fast_policy();
        let deadline = Instant::now() + Duration::from_millis(200);

        let result = policy
            .retry(deadline, || {
                let counter = counter.clone();
                let failure = failure.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if let Some(err) = failure.lock().await.take() {
                        return Err(err);
                    }
                    // second attempt outlives the deadline
                    sleep(Duration::from_secs(5)).await;
                    Ok(())
                }
            })
            .await;

        assert!(matches!(
            result,
            Err(BetfairError::DeadlineExceeded { attempts: 2 })
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_deadline_makes_no_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let policy = fast_policy();
        let deadline = Instant::now();

        let result = policy
            .retry(deadline, || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;

        assert!(matches!(
            result,
            Err(BetfairError::DeadlineExceeded { attempts: 0 })
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
