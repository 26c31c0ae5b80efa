//! Intercepting API client.
//!
//! Every platform call goes through [`ApiClient::send`]. A 401 on an ordinary
//! request hands control to the [`RefreshCoordinator`]; when the refresh
//! succeeds the original request is replayed once, otherwise the refresh error
//! is returned. Requests to the login or refresh endpoints, and replays, are
//! never intercepted.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::SessionResult;
use crate::refresh::RefreshCoordinator;
use crate::transport::{ApiRequest, ApiResponse, Transport};

struct ClientInner {
    transport: Arc<dyn Transport>,
    coordinator: RefreshCoordinator,
    login_path: String,
}

#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        coordinator: RefreshCoordinator,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                coordinator,
                login_path: login_path.into(),
            }),
        }
    }

    #[must_use]
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.inner.coordinator
    }

    /// Sends a request, refreshing the session and replaying once on 401.
    ///
    /// # Errors
    ///
    /// Non-success statuses become [`crate::SessionError::Api`]; a failed or
    /// throttled refresh surfaces as the coordinator's error.
    pub async fn send(&self, request: ApiRequest) -> SessionResult<ApiResponse> {
        let response = self.inner.transport.execute(&request).await?;
        if response.status != StatusCode::UNAUTHORIZED || !self.should_refresh(&request) {
            return response.error_for_status();
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            "Unauthorized response; coordinating token refresh"
        );
        self.inner.coordinator.refresh().await?;

        let replay = request.into_retry();
        tracing::debug!(method = %replay.method, path = %replay.path, "Replaying request after refresh");
        self.inner.transport.execute(&replay).await?.error_for_status()
    }

    fn should_refresh(&self, request: &ApiRequest) -> bool {
        !request.is_retry()
            && !request.path.contains(self.inner.login_path.as_str())
            && request.path != self.inner.coordinator.refresh_path()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> SessionResult<T> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> SessionResult<T> {
        self.send(ApiRequest::get(path).with_query(params))
            .await?
            .json()
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> SessionResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.send(ApiRequest::post(path).with_json(body))
            .await?
            .json()
    }

    /// `POST` without a body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> SessionResult<T> {
        self.send(ApiRequest::post(path)).await?.json()
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> SessionResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.send(ApiRequest::put(path).with_json(body))
            .await?
            .json()
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> SessionResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.send(ApiRequest::patch(path).with_json(body))
            .await?
            .json()
    }

    pub async fn delete(&self, path: &str) -> SessionResult<Value> {
        self.send(ApiRequest::delete(path)).await?.json()
    }
}
