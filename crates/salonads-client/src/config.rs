//! Client configuration.
//!
//! Values come from an optional TOML file layered under environment overrides,
//! e.g. `SALONADS__CACHE_TTL=10m` or `SALONADS__ENDPOINTS__ME=/auth/whoami`.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};

/// Paths of the authentication endpoints, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEndpoints {
    pub login: String,
    pub logout: String,
    pub signup: String,
    /// Identity endpoint; responds with `{"user": {...}}`.
    pub me: String,
    pub refresh: String,
    pub forgot_password: String,
    pub reset_password: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".into(),
            logout: "/auth/logout".into(),
            signup: "/auth/signup".into(),
            me: "/auth/me".into(),
            refresh: "/auth/refresh-token".into(),
            forgot_password: "/auth/forgot-password".into(),
            reset_password: "/auth/reset-password".into(),
        }
    }
}

/// Configuration for the session cache, refresh coordinator and HTTP transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// API base URL (default: `http://localhost:3100`).
    pub base_url: String,

    /// How long a resolved identity stays fresh (default: 5 minutes).
    #[serde(with = "humantime_serde")]
    pub cache_ttl: Duration,

    /// Window after a failed refresh during which no new refresh is attempted
    /// (default: 10 seconds).
    #[serde(with = "humantime_serde")]
    pub refresh_cooldown: Duration,

    /// HTTP request timeout (default: 30 seconds).
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Login entry point handed to the redirect hook when a session ends.
    pub login_page: String,

    #[serde(default)]
    pub endpoints: AuthEndpoints,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3100".into(),
            cache_ttl: Duration::from_secs(300),       // 5 minutes
            refresh_cooldown: Duration::from_secs(10), // 10 seconds
            request_timeout: Duration::from_secs(30),  // 30 seconds
            login_page: "/auth/login".into(),
            endpoints: AuthEndpoints::default(),
        }
    }
}

impl SessionConfig {
    /// Creates a configuration with default values for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Sets the identity cache TTL.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the refresh cool-down window.
    #[must_use]
    pub fn with_refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.refresh_cooldown = cooldown;
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the login entry point used for redirects.
    #[must_use]
    pub fn with_login_page(mut self, page: impl Into<String>) -> Self {
        self.login_page = page.into();
        self
    }

    /// Replaces the endpoint paths.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: AuthEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn validate(&self) -> SessionResult<()> {
        let base = url::Url::parse(&self.base_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(SessionError::configuration(
                "base_url must use http or https",
            ));
        }
        if self.cache_ttl.is_zero() {
            return Err(SessionError::configuration("cache_ttl must be > 0"));
        }
        if self.request_timeout.is_zero() {
            return Err(SessionError::configuration("request_timeout must be > 0"));
        }
        let e = &self.endpoints;
        for (name, path) in [
            ("login", &e.login),
            ("logout", &e.logout),
            ("signup", &e.signup),
            ("me", &e.me),
            ("refresh", &e.refresh),
            ("forgot_password", &e.forgot_password),
            ("reset_password", &e.reset_password),
        ] {
            if !path.starts_with('/') {
                return Err(SessionError::configuration(format!(
                    "endpoints.{name} must start with '/'"
                )));
            }
        }
        Ok(())
    }

    /// Loads configuration from `path` (or `salonads.toml` in the working
    /// directory) and `SALONADS__*` environment variables, then validates it.
    pub fn load(path: Option<&str>) -> SessionResult<Self> {
        let mut builder = Config::builder();
        let file = path.map_or_else(|| PathBuf::from("salonads.toml"), PathBuf::from);
        if file.exists() {
            builder = builder.add_source(File::from(file));
        }
        builder = builder.add_source(
            Environment::with_prefix("SALONADS")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| SessionError::configuration(format!("config build error: {e}")))?;
        let merged: Self = cfg
            .try_deserialize()
            .map_err(|e| SessionError::configuration(format!("config deserialize error: {e}")))?;
        merged.validate()?;
        Ok(merged)
    }
}
