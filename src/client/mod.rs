//! HTTP clients for the two advisory feeds
//!
//! All retry, paging and rate-limit handling lives here; the storage and
//! matching layers never see the network.

pub mod nvd;
pub mod osv;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::config::FETCH_MAX_BACKOFF_MS;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Feed returned status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    fn is_retryable(&self) -> bool {
        !matches!(self, ClientError::NotFound(_))
    }
}

/// Run a feed request up to `max_attempts` times with bounded exponential
/// backoff
pub(crate) async fn retrying<T, F, Fut>(max_attempts: u32, mut op: F) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut backoff = Duration::from_millis(250);
    let mut attempt: u32 = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                warn!(%err, attempt, "feed request failed; retrying");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(Duration::from_millis(FETCH_MAX_BACKOFF_MS));
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn retrying_returns_first_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = retrying(5, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ClientError::InvalidResponse("transient".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retrying_stops_at_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = retrying(2, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ClientError::InvalidResponse("persistent".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(ClientError::InvalidResponse(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn retrying_does_not_retry_not_found() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = retrying(5, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ClientError::NotFound("gone".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(ClientError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
