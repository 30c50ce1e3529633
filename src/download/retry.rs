use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::FetchError;
use crate::options::Options;

/// How often and how long to wait before retrying a transient failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `None` retries until the
    /// request succeeds or fails for a non-transient reason.
    pub max_attempts: Option<u32>,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            delay,
        }
    }

    pub fn bounded(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            delay,
        }
    }

    pub fn from_options(options: &Options) -> Self {
        match options.retry_max_attempts {
            Some(max_attempts) => Self::bounded(max_attempts, options.retry_delay),
            None => Self::unbounded(options.retry_delay),
        }
    }

    fn allows_another(&self, attempts_made: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts_made < max)
    }
}

/// Run `operation` until it succeeds, fails for a non-transient reason, or the
/// policy runs out of attempts.
///
/// On failure the number of attempts made is returned with the last error.
pub async fn retry_transient<F, Fut, T>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, (u32, FetchError)>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempts = 0;

    loop {
        let result = operation(attempts).await;
        attempts += 1;

        match result {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && policy.allows_another(attempts) => {
                warn!(
                    attempt = attempts,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %err,
                    "Retrying after transient error"
                );
                tokio::time::sleep(policy.delay).await;
            }
            Err(err) => return Err((attempts, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> FetchError {
        FetchError::transient("http://x/seg.ts", "connection reset")
    }

    #[tokio::test]
    async fn succeeds_on_first_attempt() {
        let policy = RetryPolicy::bounded(3, Duration::from_millis(1));
        let result = retry_transient(&policy, |_| async { Ok::<_, FetchError>(42u32) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn http_status_is_not_retried() {
        let policy = RetryPolicy::unbounded(Duration::from_millis(1));
        let attempts = AtomicU32::new(0);

        let result: Result<u32, _> = retry_transient(&policy, |_| {
            attempts.fetch_add(1, Ordering::Relaxed);
            async { Err(FetchError::http_status("http://x/seg.ts", StatusCode::NOT_FOUND)) }
        })
        .await;

        let (made, err) = result.unwrap_err();
        assert_eq!(made, 1);
        assert!(matches!(err, FetchError::HttpStatus { .. }));
        assert_eq!(attempts.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn bounded_policy_gives_up() {
        let policy = RetryPolicy::bounded(3, Duration::from_millis(1));
        let attempts = AtomicU32::new(0);

        let result: Result<u32, _> = retry_transient(&policy, |_| {
            attempts.fetch_add(1, Ordering::Relaxed);
            async { Err(transient()) }
        })
        .await;

        let (made, err) = result.unwrap_err();
        assert_eq!(made, 3);
        assert!(err.is_transient());
        assert_eq!(attempts.load(Ordering::Relaxed), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_policy_keeps_waiting_the_fixed_delay() {
        let policy = RetryPolicy::unbounded(Duration::from_secs(3));
        let started = tokio::time::Instant::now();

        let result = retry_transient(&policy, |attempt| async move {
            if attempt < 25 {
                Err(transient())
            } else {
                Ok(attempt)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 25);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(3 * 25));
        assert!(elapsed < Duration::from_secs(3 * 26));
    }

    #[test]
    fn policy_follows_options() {
        let mut options = Options::default();
        assert_eq!(
            RetryPolicy::from_options(&options),
            RetryPolicy::unbounded(Duration::from_secs(3))
        );

        options.retry_max_attempts = Some(5);
        options.retry_delay = Duration::from_secs(1);
        assert_eq!(
            RetryPolicy::from_options(&options),
            RetryPolicy::bounded(5, Duration::from_secs(1))
        );
    }

    #[test]
    fn bounded_never_allows_zero_attempts() {
        assert_eq!(RetryPolicy::bounded(0, Duration::ZERO).max_attempts, Some(1));
    }
}
