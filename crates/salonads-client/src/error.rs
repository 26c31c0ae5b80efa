//! Error types for the session-aware API client.
//!
//! Every fallible operation in this crate returns [`SessionError`]. The type is
//! `Clone` because a single in-flight refresh or identity lookup hands the same
//! outcome to every caller waiting on it.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

/// Type alias for results produced by this crate.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while talking to the platform API.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// The request never produced an HTTP response.
    #[error("Network error: {message}")]
    Network {
        /// Description of the transport failure.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The server's `message` field, or a fallback description.
        message: String,
        /// Parsed JSON error body, when the server sent one.
        body: Option<Value>,
    },

    /// The coordinated token refresh was attempted and failed.
    #[error("Token refresh failed: {message}")]
    RefreshFailed {
        /// Description of why the refresh failed.
        message: String,
    },

    /// A refresh failed recently and the cool-down window has not elapsed.
    #[error("Token refresh suppressed for another {remaining:?} after a recent failure")]
    RefreshThrottled {
        /// Time left in the cool-down window.
        remaining: Duration,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode response: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },

    /// The client configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// A URL could not be built from the configured base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl SessionError {
    /// Creates a new `Network` error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a new `RefreshFailed` error.
    #[must_use]
    pub fn refresh_failed(message: impl Into<String>) -> Self {
        Self::RefreshFailed {
            message: message.into(),
        }
    }

    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Builds an `Api` error from a non-success response.
    ///
    /// The server's JSON `message` field is preferred; otherwise the canonical
    /// reason phrase of the status is used.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let body: Option<Value> = serde_json::from_str(body).ok();
        let message = body
            .as_ref()
            .and_then(server_message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unexpected response")
                    .to_string()
            });
        Self::Api {
            status: status.as_u16(),
            message,
            body,
        }
    }

    /// Replaces the message of an `Api` error whose body carried no `message`.
    ///
    /// Errors the server described itself are returned unchanged.
    #[must_use]
    pub fn or_message(self, fallback: &str) -> Self {
        match self {
            Self::Api {
                status,
                message,
                body,
            } => {
                let described = body.as_ref().and_then(server_message).is_some();
                Self::Api {
                    status,
                    message: if described {
                        message
                    } else {
                        fallback.to_string()
                    },
                    body,
                }
            }
            other => other,
        }
    }

    /// Returns the HTTP status for `Api` errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the error means the user is no longer signed in.
    #[must_use]
    pub fn is_session_ended(&self) -> bool {
        matches!(
            self,
            Self::RefreshFailed { .. } | Self::RefreshThrottled { .. }
        ) || self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

fn server_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        Self::network(err.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}
