//! HTTP transport seam.
//!
//! [`Transport`] sends one [`ApiRequest`] and returns the raw [`ApiResponse`];
//! status handling and 401 interception live in [`crate::client::ApiClient`].
//! [`ReqwestTransport`] is the production implementation. It keeps a cookie
//! jar because the platform carries its session tokens in cookies.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};

/// A request relative to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_query(mut self, params: &[(String, String)]) -> Self {
        self.query.extend_from_slice(params);
        self
    }

    /// Whether this request is already the replay that follows a refresh.
    #[must_use]
    pub fn is_retry(&self) -> bool {
        self.retried
    }

    /// Marks the request as a replay so a second 401 is not intercepted.
    #[must_use]
    pub fn into_retry(mut self) -> Self {
        self.retried = true;
        self
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turns a non-success response into [`SessionError::Api`].
    pub fn error_for_status(self) -> SessionResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SessionError::from_response(self.status, &self.body))
        }
    }

    /// Decodes the body; an empty body decodes as JSON `null`.
    pub fn json<T: DeserializeOwned>(&self) -> SessionResult<T> {
        if self.body.trim().is_empty() {
            return serde_json::from_value(Value::Null).map_err(Into::into);
        }
        serde_json::from_str(&self.body).map_err(Into::into)
    }
}

/// Sends requests to the platform API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request. Only failures to obtain a response are errors;
    /// every HTTP status is returned as an [`ApiResponse`].
    async fn execute(&self, request: &ApiRequest) -> SessionResult<ApiResponse>;
}

/// `reqwest`-backed transport with a shared cookie jar.
pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
    jar: Arc<Jar>,
}

impl ReqwestTransport {
    /// Creates a transport with an empty cookie jar.
    pub fn new(config: &SessionConfig) -> SessionResult<Self> {
        Self::with_jar(config, Arc::new(Jar::default()))
    }

    /// Creates a transport around an existing cookie jar, e.g. one restored
    /// from disk.
    pub fn with_jar(config: &SessionConfig, jar: Arc<Jar>) -> SessionResult<Self> {
        url::Url::parse(&config.base_url)?;
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            jar,
        })
    }

    #[must_use]
    pub fn jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest) -> SessionResult<ApiResponse> {
        let url = self.url(&request.path);
        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .header("Accept", "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| {
            tracing::warn!(method = %request.method, path = %request.path, error = %e, "Request failed");
            SessionError::network(e.to_string())
        })?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::warn!(method = %request.method, path = %request.path, %status, error = %e, "Response body unreadable");
            SessionError::network(format!("failed to read response body: {e}"))
        })?;
        tracing::trace!(method = %request.method, path = %request.path, %status, "Response received");
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builders() {
        let req = ApiRequest::get("/api/ads")
            .with_query(&[("status".to_string(), "active".to_string())]);
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.query.len(), 1);
        assert!(!req.is_retry());
        assert!(req.into_retry().is_retry());

        let req = ApiRequest::put("/api/ads/1").with_json(json!({"is_active": false}));
        assert_eq!(req.body, Some(json!({"is_active": false})));
    }

    #[test]
    fn test_response_json_and_status() {
        let ok = ApiResponse::new(StatusCode::OK, r#"{"user":{"id":1,"email":"a@b.c"}}"#);
        let value: Value = ok.json().unwrap();
        assert_eq!(value["user"]["id"], json!(1));

        let empty = ApiResponse::new(StatusCode::NO_CONTENT, "");
        assert_eq!(empty.json::<Value>().unwrap(), Value::Null);

        let denied = ApiResponse::new(StatusCode::FORBIDDEN, r#"{"message":"Admins only"}"#);
        let err = denied.error_for_status().unwrap_err();
        assert_eq!(err.to_string(), "HTTP 403: Admins only");
    }

    #[tokio::test]
    async fn test_truncated_body_is_a_network_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await.unwrap();
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"user\":",
                )
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let transport = ReqwestTransport::new(&SessionConfig::new(format!("http://{addr}"))).unwrap();
        let err = transport.execute(&ApiRequest::get("/auth/me")).await.unwrap_err();

        assert!(matches!(err, SessionError::Network { .. }));
        server.await.unwrap();
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let config = SessionConfig::new("http://localhost:3100/");
        let transport = ReqwestTransport::new(&config).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:3100");
        assert_eq!(transport.url("/auth/me"), "http://localhost:3100/auth/me");
    }
}
