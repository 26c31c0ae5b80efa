//! Coordinated token refresh.
//!
//! When any request comes back 401, [`RefreshCoordinator::refresh`] is the
//! only way a new token is requested. Concurrent callers join the same
//! in-flight refresh, so a burst of 401s costs exactly one refresh call.
//!
//! A failed refresh ends the session: the identity cache is expired (which
//! notifies listeners with `None`) and the [`LoginRedirect`] hook fires once.
//! For `cooldown` after a failure, further refresh requests are rejected with
//! [`SessionError::RefreshThrottled`] without touching the network.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::cache::SessionCache;
use crate::error::{SessionError, SessionResult};
use crate::transport::{ApiRequest, Transport};

type RefreshFlight = Shared<BoxFuture<'static, SessionResult<()>>>;

/// Sends the user back to the login entry point once a session has ended.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self, login_page: &str);
}

/// Redirect hook for headless use: records the event in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRedirect;

impl LoginRedirect for TracingRedirect {
    fn redirect_to_login(&self, login_page: &str) {
        tracing::warn!(login_page, "Session ended; sign in again");
    }
}

impl<F> LoginRedirect for F
where
    F: Fn(&str) + Send + Sync,
{
    fn redirect_to_login(&self, login_page: &str) {
        self(login_page);
    }
}

#[derive(Default)]
struct RefreshState {
    in_flight: Option<RefreshFlight>,
    last_failure: Option<Instant>,
}

struct RefreshInner {
    transport: Arc<dyn Transport>,
    session: SessionCache,
    redirect: Arc<dyn LoginRedirect>,
    refresh_path: String,
    login_page: String,
    cooldown: Duration,
    state: Mutex<RefreshState>,
}

/// Single-flight token refresh with a failure cool-down.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<RefreshInner>,
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        session: SessionCache,
        redirect: Arc<dyn LoginRedirect>,
        refresh_path: impl Into<String>,
        login_page: impl Into<String>,
        cooldown: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(RefreshInner {
                transport,
                session,
                redirect,
                refresh_path: refresh_path.into(),
                login_page: login_page.into(),
                cooldown,
                state: Mutex::new(RefreshState::default()),
            }),
        }
    }

    #[must_use]
    pub fn refresh_path(&self) -> &str {
        &self.inner.refresh_path
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner.state.lock().in_flight.is_some()
    }

    /// Requests a new token, joining the in-flight refresh if there is one.
    ///
    /// # Errors
    ///
    /// Returns `RefreshThrottled` inside the cool-down window after a failure,
    /// and `RefreshFailed` when the refresh endpoint rejects the session.
    pub async fn refresh(&self) -> SessionResult<()> {
        let flight = {
            let mut state = self.inner.state.lock();
            if let Some(flight) = &state.in_flight {
                tracing::debug!("Joining in-flight token refresh");
                flight.clone()
            } else {
                if let Some(failed_at) = state.last_failure {
                    let elapsed = failed_at.elapsed();
                    if elapsed < self.inner.cooldown {
                        let remaining = self.inner.cooldown - elapsed;
                        tracing::debug!(?remaining, "Token refresh suppressed by cool-down");
                        return Err(SessionError::RefreshThrottled { remaining });
                    }
                }
                tracing::debug!(path = %self.inner.refresh_path, "Starting token refresh");
                let inner = Arc::clone(&self.inner);
                let flight = async move { inner.run().await }.boxed().shared();
                state.in_flight = Some(flight.clone());
                flight
            }
        };
        flight.await
    }

    /// Forgets a previous failure so a new session starts without a
    /// cool-down.
    pub fn reset(&self) {
        let mut state = self.inner.state.lock();
        if state.last_failure.take().is_some() {
            tracing::debug!("Refresh cool-down cleared");
        }
    }

    /// Waits for an in-flight refresh, if any, to settle. Its outcome is
    /// ignored.
    pub async fn wait_idle(&self) {
        let flight = self.inner.state.lock().in_flight.clone();
        if let Some(flight) = flight {
            let _ = flight.await;
        }
    }
}

impl RefreshInner {
    async fn run(self: Arc<Self>) -> SessionResult<()> {
        // marked as a replay so the interceptor never recurses on it
        let request = ApiRequest::post(self.refresh_path.as_str()).into_retry();
        let outcome = match self.transport.execute(&request).await {
            Ok(resp) if resp.is_success() => Ok(()),
            Ok(resp) => Err(SessionError::refresh_failed(
                SessionError::from_response(resp.status, &resp.body).to_string(),
            )),
            Err(err) => Err(SessionError::refresh_failed(err.to_string())),
        };

        {
            let mut state = self.state.lock();
            state.in_flight = None;
            state.last_failure = outcome.as_ref().err().map(|_| Instant::now());
        }

        match &outcome {
            Ok(()) => tracing::debug!("Token refresh succeeded"),
            Err(err) => {
                tracing::warn!(error = %err, "Token refresh failed; ending session");
                self.session.expire();
                self.redirect.redirect_to_login(&self.login_page);
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscribers::Subscribers;
    use crate::testing::{ScriptedTransport, json_response};
    use futures_util::future::join_all;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn coordinator(
        transport: Arc<ScriptedTransport>,
        redirects: &Arc<AtomicUsize>,
        cooldown: Duration,
    ) -> RefreshCoordinator {
        let redirects = Arc::clone(redirects);
        let session = SessionCache::new(Duration::from_secs(300), Arc::new(Subscribers::new()));
        RefreshCoordinator::new(
            transport,
            session,
            Arc::new(move |_: &str| {
                redirects.fetch_add(1, Ordering::SeqCst);
            }),
            "/auth/refresh-token",
            "/auth/login",
            cooldown,
        )
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_share_one_call() {
        let transport = Arc::new(
            ScriptedTransport::new(|_| Ok(json_response(StatusCode::OK, json!({"ok": true}))))
                .with_delay(Duration::from_millis(50)),
        );
        let redirects = Arc::new(AtomicUsize::new(0));
        let coordinator = coordinator(Arc::clone(&transport), &redirects, Duration::from_secs(10));

        let results = join_all((0..5).map(|_| coordinator.refresh())).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(transport.calls_to("/auth/refresh-token"), 1);
        assert!(!coordinator.is_refreshing());
        assert_eq!(redirects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_is_throttled() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            Ok(json_response(
                StatusCode::UNAUTHORIZED,
                json!({"message": "Refresh token expired"}),
            ))
        }));
        let redirects = Arc::new(AtomicUsize::new(0));
        let coordinator = coordinator(Arc::clone(&transport), &redirects, Duration::from_secs(10));

        let err = coordinator.refresh().await.unwrap_err();
        assert!(matches!(err, SessionError::RefreshFailed { .. }));
        assert!(err.to_string().contains("Refresh token expired"));

        let err = coordinator.refresh().await.unwrap_err();
        match err {
            SessionError::RefreshThrottled { remaining } => {
                assert!(remaining <= Duration::from_secs(10));
            }
            other => panic!("expected throttling, got {other:?}"),
        }
        assert_eq!(transport.calls_to("/auth/refresh-token"), 1);
        assert_eq!(redirects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_allowed_after_cooldown() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            Ok(json_response(StatusCode::UNAUTHORIZED, json!({})))
        }));
        let redirects = Arc::new(AtomicUsize::new(0));
        let coordinator =
            coordinator(Arc::clone(&transport), &redirects, Duration::from_millis(30));

        assert!(coordinator.refresh().await.is_err());
        tokio::time::sleep(Duration::from_millis(50)).await;
        let err = coordinator.refresh().await.unwrap_err();
        assert!(matches!(err, SessionError::RefreshFailed { .. }));
        assert_eq!(transport.calls_to("/auth/refresh-token"), 2);
    }

    #[tokio::test]
    async fn test_reset_clears_cooldown() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            Ok(json_response(StatusCode::UNAUTHORIZED, json!({})))
        }));
        let redirects = Arc::new(AtomicUsize::new(0));
        let coordinator = coordinator(Arc::clone(&transport), &redirects, Duration::from_secs(10));

        assert!(coordinator.refresh().await.is_err());
        coordinator.reset();
        let err = coordinator.refresh().await.unwrap_err();

        assert!(matches!(err, SessionError::RefreshFailed { .. }));
        assert_eq!(transport.calls_to("/auth/refresh-token"), 2);
    }

    #[tokio::test]
    async fn test_network_failure_ends_session() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            Err(SessionError::network("connection refused"))
        }));
        let redirects = Arc::new(AtomicUsize::new(0));
        let coordinator = coordinator(Arc::clone(&transport), &redirects, Duration::from_secs(10));

        let err = coordinator.refresh().await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(redirects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wait_idle_blocks_until_refresh_settles() {
        let transport = Arc::new(
            ScriptedTransport::new(|_| Ok(json_response(StatusCode::OK, json!({}))))
                .with_delay(Duration::from_millis(40)),
        );
        let redirects = Arc::new(AtomicUsize::new(0));
        let coordinator = coordinator(Arc::clone(&transport), &redirects, Duration::from_secs(10));

        let waiter = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert!(coordinator.is_refreshing());
            coordinator.wait_idle().await;
            assert!(!coordinator.is_refreshing());
        };
        let (refreshed, ()) = tokio::join!(coordinator.refresh(), waiter);
        assert!(refreshed.is_ok());
    }
}
