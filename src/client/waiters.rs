//! Polling helpers that wait for a bucket or object to appear.

use crate::errors::{ClientError, ClientResult};
use std::{future::Future, time::Duration};
use tracing::debug;

/// How often and how long a waiter polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaiterConfig {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            max_attempts: 20,
        }
    }
}

/// Fixed-delay poller owned by a client.
///
/// Built lazily on first use of [`crate::client::ObjectStoreClient::waiters`]
/// and shared by every caller of that client afterwards.
#[derive(Debug)]
pub struct Waiters {
    config: WaiterConfig,
}

impl Waiters {
    pub(crate) fn new(config: WaiterConfig) -> Self {
        debug!(?config, "initialising waiters");
        Self { config }
    }

    pub fn config(&self) -> WaiterConfig {
        self.config
    }

    /// Run `probe` until it reports `true`, sleeping `delay` between attempts.
    ///
    /// Errors from the probe abort the wait. After `max_attempts` negative
    /// answers the wait fails with [`ClientError::WaitTimeout`].
    pub async fn poll_until<F, Fut>(&self, what: &str, mut probe: F) -> ClientResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ClientResult<bool>>,
    {
        let attempts = self.config.max_attempts.max(1);
        for attempt in 1..=attempts {
            if probe().await? {
                debug!(what, attempt, "wait condition met");
                return Ok(());
            }
            debug!(what, attempt, attempts, "wait condition not met yet");
            if attempt < attempts {
                tokio::time::sleep(self.config.delay).await;
            }
        }

        Err(ClientError::WaitTimeout {
            what: what.to_string(),
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> Waiters {
        Waiters::new(WaiterConfig {
            delay: Duration::from_millis(1),
            max_attempts,
        })
    }

    #[tokio::test]
    async fn stops_once_condition_holds() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        fast(5)
            .poll_until("thing", move || async move {
                Ok(counter.fetch_add(1, Ordering::SeqCst) == 2)
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn times_out_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = fast(3)
            .poll_until("thing", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(false)
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::WaitTimeout { attempts: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn probe_errors_abort_the_wait() {
        let err = fast(10)
            .poll_until("thing", || async {
                Err(ClientError::protocol(500, "boom", ""))
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }
}
