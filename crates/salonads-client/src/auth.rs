//! Authentication service.
//!
//! [`AuthService`] wires the identity cache, the refresh coordinator and the
//! intercepting client together and exposes the account operations of the
//! platform: login, sign-up, logout, identity checks and password reset.
//!
//! # Example
//!
//! ```ignore
//! use salonads_client::{AuthService, Credentials, SessionConfig};
//!
//! let auth = AuthService::new(SessionConfig::new("https://api.example.com"))?;
//! auth.subscribe(std::sync::Arc::new(|user| println!("signed in: {}", user.is_some())));
//! auth.login(&Credentials::new("owner@salon.kr", "secret")).await?;
//! let me = auth.current_user().await;
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::cache::{SessionCache, SessionState};
use crate::client::ApiClient;
use crate::config::{AuthEndpoints, SessionConfig};
use crate::error::{SessionError, SessionResult};
use crate::refresh::{LoginRedirect, RefreshCoordinator, TracingRedirect};
use crate::subscribers::{Listener, Subscribers, SubscriptionId};
use crate::transport::{ApiRequest, ReqwestTransport, Transport};
use crate::types::{
    Credentials, MeResponse, PasswordReset, PasswordResetRequest, RegisterRequest, User,
};

/// Builder for [`AuthService`] with pluggable transport and redirect hook.
pub struct AuthServiceBuilder {
    config: SessionConfig,
    transport: Option<Arc<dyn Transport>>,
    redirect: Arc<dyn LoginRedirect>,
}

impl AuthServiceBuilder {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            transport: None,
            redirect: Arc::new(TracingRedirect),
        }
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
        self.redirect = redirect;
        self
    }

    /// Validates the configuration and assembles the service. Without an
    /// explicit transport a [`ReqwestTransport`] is created.
    pub fn build(self) -> SessionResult<AuthService> {
        self.config.validate()?;
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.config)?),
        };

        let subscribers = Arc::new(Subscribers::new());
        let session = SessionCache::new(self.config.cache_ttl, subscribers);
        let coordinator = RefreshCoordinator::new(
            Arc::clone(&transport),
            session.clone(),
            Arc::clone(&self.redirect),
            self.config.endpoints.refresh.clone(),
            self.config.login_page.clone(),
            self.config.refresh_cooldown,
        );
        let api = ApiClient::new(transport, coordinator, self.config.endpoints.login.clone());

        Ok(AuthService {
            api,
            session,
            redirect: self.redirect,
            endpoints: self.config.endpoints,
            login_page: self.config.login_page,
        })
    }
}

/// Account operations backed by the shared identity cache.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    session: SessionCache,
    redirect: Arc<dyn LoginRedirect>,
    endpoints: AuthEndpoints,
    login_page: String,
}

impl AuthService {
    /// Creates a service with the `reqwest` transport and the logging
    /// redirect hook.
    pub fn new(config: SessionConfig) -> SessionResult<Self> {
        AuthServiceBuilder::new(config).build()
    }

    #[must_use]
    pub fn builder(config: SessionConfig) -> AuthServiceBuilder {
        AuthServiceBuilder::new(config)
    }

    /// The intercepting client, for resource services.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn session(&self) -> &SessionCache {
        &self.session
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.api.coordinator().is_refreshing() {
            SessionState::Refreshing
        } else {
            self.session.state()
        }
    }

    /// Signs in and resolves the new identity, notifying listeners.
    ///
    /// # Errors
    ///
    /// The server's message when it gave one, otherwise "Login failed".
    pub async fn login(&self, credentials: &Credentials) -> SessionResult<Value> {
        let body: Value = self
            .api
            .post_json(&self.endpoints.login, credentials)
            .await
            .map_err(|e| e.or_message("Login failed"))?;
        tracing::debug!("Logged in");
        self.api.coordinator().reset();
        self.session.invalidate();
        self.check_auth().await;
        Ok(body)
    }

    pub async fn register(&self, request: &RegisterRequest) -> SessionResult<Value> {
        self.api
            .post_json(&self.endpoints.signup, request)
            .await
            .map_err(|e| e.or_message("Registration failed"))
    }

    /// Ends the session locally, tells the server, and redirects to the login
    /// page whether or not the server call succeeded.
    pub async fn logout(&self) {
        self.session.expire();
        // the session is already gone locally; a 401 here must not start a refresh
        let request = ApiRequest::get(self.endpoints.logout.as_str()).into_retry();
        if let Err(err) = self.api.send(request).await {
            tracing::warn!(error = %err, "Logout request failed");
        } else {
            tracing::info!("Logged out");
        }
        self.redirect.redirect_to_login(&self.login_page);
    }

    /// Resolves the current user through the cache.
    ///
    /// Waits for an in-flight token refresh before resolving. Any failure
    /// resolves to `None`.
    pub async fn check_auth(&self) -> Option<User> {
        self.api.coordinator().wait_idle().await;
        let api = self.api.clone();
        let me_path = self.endpoints.me.clone();
        self.session
            .resolve_with(move || async move {
                let me: MeResponse = api.get_json(&me_path).await?;
                Ok::<_, SessionError>(me.user)
            })
            .await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.check_auth().await.is_some()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.check_auth().await
    }

    /// The cached user, without any I/O. May be stale.
    #[must_use]
    pub fn current_user_sync(&self) -> Option<User> {
        self.session.cached_user()
    }

    /// Registers a listener for identity changes. The listener is not called
    /// with the current identity; use [`Self::current_user_sync`] for that.
    pub fn subscribe(&self, listener: Listener) -> SubscriptionId {
        self.session.subscribers().subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.session.subscribers().unsubscribe(id)
    }

    pub async fn request_password_reset(&self, email: &str) -> SessionResult<Value> {
        self.api
            .post_json(
                &self.endpoints.forgot_password,
                &PasswordResetRequest { email },
            )
            .await
            .map_err(|e| e.or_message("Password reset request failed"))
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> SessionResult<Value> {
        self.api
            .post_json(
                &self.endpoints.reset_password,
                &PasswordReset {
                    token,
                    new_password,
                },
            )
            .await
            .map_err(|e| e.or_message("Password reset failed"))
    }
}
