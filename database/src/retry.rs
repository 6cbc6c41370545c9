use std::future::Future;
use std::time::Duration;

use crate::errors::DbResult;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Exponential backoff for writes that raced ahead of a referenced row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retry: u8,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retry: u8, base_delay: Duration) -> Self {
        Self {
            max_retry,
            base_delay,
        }
    }

    /// Delay before retry number `attempt` (zero based), doubled each time
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .checked_mul(2u32.saturating_pow(attempt))
            .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or `max_retry` retries are used up. The last error is returned.
    pub async fn run<T, F, Fut>(&self, method_name: &str, mut operation: F) -> DbResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DbResult<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match operation().await {
                Err(err) if err.is_retryable() && attempt < u32::from(self.max_retry) => {
                    let delay = self.delay_for(attempt);
                    attempt += 1;
                    tracing::warn!(
                        target: crate::DATABASE,
                        "{} failed, retry {}/{} in {:?}: {}",
                        method_name,
                        attempt,
                        self.max_retry,
                        delay,
                        err,
                    );
                    crate::metrics::DATABASE_WRITE_RETRIES
                        .with_label_values(&[method_name])
                        .inc();
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    if err.is_retryable() {
                        tracing::error!(
                            target: crate::DATABASE,
                            "{} failed after {} retries: {}",
                            method_name,
                            attempt,
                            err,
                        );
                    }
                    return Err(err);
                }
                Ok(value) => return Ok(value),
            }
        }
    }
}

impl From<&configuration::WriteConfig> for RetryPolicy {
    fn from(config: &configuration::WriteConfig) -> Self {
        Self::new(config.max_retry, config.retry_base_delay())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&configuration::WriteConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::errors::DbError;

    fn fast_policy(max_retry: u8) -> RetryPolicy {
        RetryPolicy::new(max_retry, Duration::from_millis(1))
    }

    #[test]
    fn delay_doubles_and_is_capped() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for(20), MAX_RETRY_DELAY);
        assert_eq!(policy.delay_for(u32::MAX), MAX_RETRY_DELAY);
    }

    #[tokio::test]
    async fn retries_missing_references_until_success() {
        let calls = &AtomicU32::new(0);
        let result = fast_policy(5)
            .run("save_transactions", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(DbError::missing_reference("transactions_block_fkey"))
                } else {
                    Ok(42)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_the_budget() {
        let calls = &AtomicU32::new(0);
        let result: DbResult<()> = fast_policy(2)
            .run("save_blocks", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DbError::missing_reference("blocks_masterchain_block_fkey"))
            })
            .await;
        assert!(matches!(result, Err(DbError::MissingReference { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: DbResult<()> = fast_policy(5)
            .run("save_transaction_messages", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DbError::Constraint("second inbound message".to_string()))
            })
            .await;
        assert!(matches!(result, Err(DbError::Constraint(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
