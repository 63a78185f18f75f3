use std::{future::Future, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use stakeops_common::TimeoutConfig;
use tokio::time::{sleep, timeout};
use tracing::warn;
use url::Url;

use crate::{dispatcher::RequestDispatcher, error::TransportError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Per-attempt deadline, `None` waits on the transport's own defaults.
    pub request_timeout: Option<Duration>,
    /// Attempts after the first one.
    pub max_retries: u32,
    pub backoff: Duration,
}

impl From<&TimeoutConfig> for RetryPolicy {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            max_retries: config.max_retries,
            backoff: config.retry_backoff(),
        }
    }
}

/// Adds a per-request timeout and bounded retries to any [`RequestDispatcher`].
#[derive(Clone, Debug)]
pub struct ResilientDispatcher<D> {
    inner: D,
    policy: RetryPolicy,
}

impl<D: RequestDispatcher> ResilientDispatcher<D> {
    pub fn new(inner: D, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn attempt<'a, F, Fut>(&'a self, path: &str, request: F) -> Result<Bytes, TransportError>
    where
        F: Fn(&'a D) -> Fut,
        Fut: Future<Output = Result<Bytes, TransportError>> + 'a,
    {
        let mut attempt = 0;
        loop {
            let result = match self.policy.request_timeout {
                Some(limit) => timeout(limit, request(&self.inner))
                    .await
                    .unwrap_or(Err(TransportError::Timeout(limit))),
                None => request(&self.inner).await,
            };

            match result {
                Err(err) if err.is_retryable() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    warn!(
                        path,
                        attempt,
                        max_retries = self.policy.max_retries,
                        %err,
                        "beacon request failed, retrying"
                    );
                    sleep(self.policy.backoff).await;
                }
                result => return result,
            }
        }
    }
}

#[async_trait]
impl<D: RequestDispatcher> RequestDispatcher for ResilientDispatcher<D> {
    async fn get(&self, path: &str) -> Result<Bytes, TransportError> {
        self.attempt(path, |inner| inner.get(path)).await
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<Bytes, TransportError> {
        self.attempt(path, |inner| inner.post_json(path, body)).await
    }

    fn provider_url(&self) -> &Url {
        self.inner.provider_url()
    }
}
