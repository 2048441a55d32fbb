//! Exponential-backoff retry for transient upstream failures.
//!
//! Only `GatewayError::BackendTransient` is retried; definitive failures
//! (bad voice, malformed request) return immediately so callers can fail
//! over to the next backend rather than waste time looping.

use std::time::Duration;
use tts_gateway_core::error::GatewayError;

pub async fn with_retry<F, Fut, T>(
    backend: &str,
    max_retries: u32,
    initial_backoff: Duration,
    mut attempt: F,
) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, GatewayError>>,
{
    let mut backoff = initial_backoff;
    let mut last_err = None;

    for retry in 0..=max_retries {
        if retry > 0 {
            tracing::warn!(backend, retry, ?backoff, "retrying after transient failure");
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }

        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() => last_err = Some(e),
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| GatewayError::BackendTransient {
        backend: backend.to_string(),
        message: "max retries exceeded".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test", 3, Duration::from_millis(1), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(GatewayError::BackendTransient {
                    backend: "test".into(),
                    message: "timeout".into(),
                })
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn definitive_failure_skips_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<i32, _> = with_retry("test", 3, Duration::from_millis(1), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(GatewayError::BackendDefinitive {
                backend: "test".into(),
                message: "bad voice".into(),
            })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
