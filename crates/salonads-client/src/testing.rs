//! In-memory transport for unit tests.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::SessionResult;
use crate::transport::{ApiRequest, ApiResponse, Transport};

type Handler = dyn Fn(&ApiRequest) -> SessionResult<ApiResponse> + Send + Sync;

/// Answers every request with a handler closure after an optional delay and
/// records what was sent.
pub(crate) struct ScriptedTransport {
    handler: Box<Handler>,
    delay: Duration,
    calls: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(
        handler: impl Fn(&ApiRequest) -> SessionResult<ApiResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls_to(&self, path: &str) -> usize {
        self.calls.lock().iter().filter(|r| r.path == path).count()
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: &ApiRequest) -> SessionResult<ApiResponse> {
        self.calls.lock().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.handler)(request)
    }
}

pub(crate) fn json_response(status: StatusCode, body: Value) -> ApiResponse {
    ApiResponse::new(status, body.to_string())
}
