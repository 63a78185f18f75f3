use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::StatusCode;
use url::Url;

use crate::{dispatcher::RequestDispatcher, error::TransportError};

#[derive(Clone, Debug)]
pub struct MockResponse {
    status: StatusCode,
    body: String,
    delay: Duration,
}

impl MockResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: StatusCode::OK, body: body.into(), delay: Duration::ZERO }
    }

    pub fn status(status: StatusCode) -> Self {
        Self { status, body: String::new(), delay: Duration::ZERO }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
struct MockState {
    /// Queued responses per path, the last one repeats.
    responses: HashMap<String, Vec<MockResponse>>,
    calls: HashMap<String, usize>,
    bodies: Vec<serde_json::Value>,
}

/// In-memory [`RequestDispatcher`] with scripted responses per path.
#[derive(Clone)]
pub struct MockDispatcher {
    endpoint: Url,
    state: Arc<Mutex<MockState>>,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self {
            endpoint: Url::parse("http://mock.beacon:5052").expect("static url"),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    pub fn with_response(self, path: &str, response: MockResponse) -> Self {
        self.state.lock().responses.entry(path.to_string()).or_default().push(response);
        self
    }

    pub fn calls(&self, path: &str) -> usize {
        self.state.lock().calls.get(path).copied().unwrap_or_default()
    }

    pub fn posted_bodies(&self) -> Vec<serde_json::Value> {
        self.state.lock().bodies.clone()
    }

    async fn respond(&self, path: &str) -> Result<Bytes, TransportError> {
        let response = {
            let mut state = self.state.lock();
            let call = {
                let calls = state.calls.entry(path.to_string()).or_default();
                *calls += 1;
                *calls - 1
            };
            state
                .responses
                .get(path)
                .and_then(|queue| queue.get(call).or_else(|| queue.last()))
                .cloned()
                .unwrap_or_else(|| MockResponse::status(StatusCode::NOT_FOUND))
        };

        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }

        if response.status.is_success() {
            Ok(Bytes::from(response.body))
        } else {
            Err(TransportError::Status { status: response.status, body: response.body })
        }
    }
}

#[async_trait]
impl RequestDispatcher for MockDispatcher {
    async fn get(&self, path: &str) -> Result<Bytes, TransportError> {
        self.respond(path).await
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<Bytes, TransportError> {
        self.state.lock().bodies.push(body.clone());
        self.respond(path).await
    }

    fn provider_url(&self) -> &Url {
        &self.endpoint
    }
}
