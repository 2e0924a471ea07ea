//! Retry logic with exponential backoff
//!
//! Listing calls against the storage service are retried when the failure
//! is transient (throttling, server errors, timeouts, connection drops).

use crate::error::{BlobTierError, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RetryOptions {
    pub max_retries: usize,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Whether an error is worth retrying.
///
/// Only errors classified from a transient status or an IO failure qualify;
/// message text is never inspected.
pub fn is_retryable_error(error: &BlobTierError) -> bool {
    matches!(error, BlobTierError::NetworkError(_))
}

pub async fn retry_with_backoff<T, F, Fut>(mut operation: F, options: RetryOptions) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut interval = options.initial_interval;
    let mut last_error = None;

    for attempt in 0..=options.max_retries {
        if attempt > 0 {
            debug!("Retry {} of {} in {:?}", attempt, options.max_retries, interval);
            sleep(interval).await;
            interval = std::cmp::min(
                Duration::from_secs_f64(interval.as_secs_f64() * options.multiplier),
                options.max_interval,
            );
        }

        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if !is_retryable_error(&error) {
                    return Err(error);
                }

                last_error = Some(error);
                if attempt == options.max_retries {
                    break;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| BlobTierError::unknown("Retry failed with no error")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use azure_core::error::ErrorKind;
    use azure_core::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast() -> RetryOptions {
        RetryOptions {
            max_retries: 2,
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(2),
            multiplier: 2.0,
        }
    }

    fn http_error(status: StatusCode, message: &'static str) -> BlobTierError {
        BlobTierError::from(azure_core::Error::message(
            ErrorKind::HttpResponse {
                status,
                error_code: None,
            },
            message,
        ))
    }

    #[test]
    fn test_is_retryable_error() {
        assert!(is_retryable_error(&http_error(StatusCode::ServiceUnavailable, "Server Busy")));
        assert!(is_retryable_error(&http_error(StatusCode::TooManyRequests, "slow down")));
        assert!(!is_retryable_error(&http_error(StatusCode::Forbidden, "denied")));
        assert!(!is_retryable_error(&http_error(StatusCode::NotFound, "not found")));
    }

    #[test]
    fn test_status_like_text_is_not_retried() {
        let conflict = http_error(StatusCode::Conflict, "RequestId:5030-500-timeout");
        assert!(!is_retryable_error(&conflict));
        assert!(!is_retryable_error(&BlobTierError::azure_api("503 Server Busy")));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let calls = AtomicUsize::new(0);
        let result = retry_with_backoff(
            || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(BlobTierError::NetworkError("throttled".to_string()))
                    } else {
                        Ok(attempt)
                    }
                }
            },
            fast(),
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_fail_fast() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_with_backoff(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(BlobTierError::permission_denied("AuthorizationFailure")) }
            },
            fast(),
        )
        .await;

        assert!(matches!(result, Err(BlobTierError::PermissionDenied(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
