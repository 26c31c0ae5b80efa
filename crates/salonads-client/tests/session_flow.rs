//! End-to-end session behaviour against a mock platform API.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use salonads_client::{
    AuthService, Credentials, SalonService, SessionConfig, SessionError, SessionState, User,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn owner() -> Value {
    json!({"user": {"id": 7, "email": "owner@salon.kr", "name": "Mina", "role": "owner"}})
}

fn service(server: &MockServer, redirects: &Arc<Mutex<Vec<String>>>) -> AuthService {
    let redirects = Arc::clone(redirects);
    AuthService::builder(SessionConfig::new(server.uri()))
        .redirect(Arc::new(move |page: &str| redirects.lock().push(page.to_string())))
        .build()
        .unwrap()
}

#[tokio::test]
async fn concurrent_identity_checks_share_one_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(owner())
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let redirects = Arc::new(Mutex::new(Vec::new()));
    let auth = service(&server, &redirects);

    let (a, b, c) = tokio::join!(auth.check_auth(), auth.check_auth(), auth.is_authenticated());
    assert_eq!(a.as_ref().map(|u| u.email.as_str()), Some("owner@salon.kr"));
    assert_eq!(a, b);
    assert!(c);

    // within the freshness window the cache answers without I/O
    assert!(auth.current_user().await.is_some());
    assert_eq!(auth.state(), SessionState::ValidSession);
}

#[tokio::test]
async fn login_stores_cookies_and_notifies_listeners() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "owner@salon.kr", "password": "pw"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "access_token=abc123; Path=/; HttpOnly")
                .set_body_json(json!({"message": "ok"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("cookie", "access_token=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(owner()))
        .expect(1)
        .mount(&server)
        .await;

    let redirects = Arc::new(Mutex::new(Vec::new()));
    let auth = service(&server, &redirects);
    let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    auth.subscribe(Arc::new(move |user: Option<&User>| {
        sink.lock().push(user.map(|u| u.email.clone()));
    }));

    auth.login(&Credentials::new("owner@salon.kr", "pw"))
        .await
        .unwrap();

    assert_eq!(*seen.lock(), vec![Some("owner@salon.kr".to_string())]);
    assert_eq!(
        auth.current_user_sync().map(|u| u.display_name().to_string()),
        Some("Mina".to_string())
    );
}

#[tokio::test]
async fn simultaneous_401s_trigger_a_single_refresh() {
    let server = MockServer::start().await;
    for route in ["/api/ads", "/api/admin/salons"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})),
            )
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"route": route}])))
            .with_priority(2)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let redirects = Arc::new(Mutex::new(Vec::new()));
    let auth = service(&server, &redirects);
    let salons = SalonService::new(auth.api().clone());

    let (ads, listed) = tokio::join!(
        auth.api().get_json::<Value>("/api/ads"),
        salons.list(),
    );

    assert_eq!(ads.unwrap(), json!([{"route": "/api/ads"}]));
    assert_eq!(listed.unwrap(), json!([{"route": "/api/admin/salons"}]));
    assert!(redirects.lock().is_empty());
}

#[tokio::test]
async fn login_failure_is_not_intercepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let redirects = Arc::new(Mutex::new(Vec::new()));
    let auth = service(&server, &redirects);

    let err = auth
        .login(&Credentials::new("owner@salon.kr", "wrong"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "HTTP 401: Invalid credentials");
    assert!(redirects.lock().is_empty());
}

#[tokio::test]
async fn failed_refresh_ends_session_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ads"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "refresh expired"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let redirects = Arc::new(Mutex::new(Vec::new()));
    let auth = service(&server, &redirects);
    let signed_out = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&signed_out);
    auth.subscribe(Arc::new(move |user: Option<&User>| {
        if user.is_none() {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }));

    let first = auth.api().get_json::<Value>("/api/ads").await;
    assert!(matches!(first, Err(SessionError::RefreshFailed { .. })));

    let second = auth.api().get_json::<Value>("/api/ads").await;
    assert!(matches!(second, Err(SessionError::RefreshThrottled { .. })));

    assert_eq!(*redirects.lock(), vec!["/auth/login".to_string()]);
    assert_eq!(signed_out.load(Ordering::SeqCst), 1);
    assert_eq!(auth.state(), SessionState::NoSession);
}

#[tokio::test]
async fn logout_redirects_even_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let redirects = Arc::new(Mutex::new(Vec::new()));
    let auth = service(&server, &redirects);

    auth.logout().await;

    assert_eq!(*redirects.lock(), vec!["/auth/login".to_string()]);
    assert!(auth.current_user_sync().is_none());
}
