// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use keyword_agent::app::{create_router, AppState, VERSION};
use keyword_agent::models::check::CheckResponse;
use keyword_agent::models::config::{EnvOverrides, MonitorConfig, PersistedConfig};
use keyword_agent::models::status::StatusResponse;
use keyword_agent::models::version::VersionResponse;
use keyword_agent::services::check::CheckRunner;
use keyword_agent::services::check_token::hash_token;
use keyword_agent::services::config_store::{ConfigLoader, ConfigStore};
use keyword_agent::services::fetcher::{HttpFetcher, DEFAULT_USER_AGENT};
use keyword_agent::services::notifier::{Notifier, NotifyError};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const TOKEN: &str = "test-check-token";

/// Records every alert instead of sending email
#[derive(Default)]
struct RecordingNotifier {
    alerts: Mutex<Vec<(Vec<String>, String)>>,
    fail: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, matched: &[String], config: &MonitorConfig) -> Result<(), NotifyError> {
        self.alerts
            .lock()
            .unwrap()
            .push((matched.to_vec(), config.target_url.to_string()));
        if self.fail {
            Err(NotifyError::Auth("535 credentials rejected".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Local stand-in for the watched event site
async fn serve_event_site() -> String {
    let app = Router::new()
        .route(
            "/events",
            get(|| async {
                axum::response::Html(
                    "<html><head><script>var concert = 1;</script></head>\
                     <body><h1>Big Sale Today</h1><p>Farmers market</p></body></html>",
                )
            }),
        )
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "not here") }),
        );

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn mail_env() -> EnvOverrides {
    EnvOverrides {
        sender_email: "bot@example.com".to_string(),
        sender_password: "app-password".to_string(),
        receiver_email: "me@example.com".to_string(),
        ..Default::default()
    }
}

struct TestApp {
    router: Router,
    notifier: Arc<RecordingNotifier>,
    store: ConfigStore,
    _dir: TempDir,
}

async fn test_app(
    persisted: PersistedConfig,
    env: EnvOverrides,
    notifier: RecordingNotifier,
) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path().join("config.json"));
    store.save(&persisted).await.unwrap();

    let notifier = Arc::new(notifier);
    let fetcher = HttpFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(5)).unwrap();
    let state = AppState {
        loader: Arc::new(ConfigLoader::new(store.clone(), env)),
        runner: CheckRunner::new(Arc::new(fetcher), notifier.clone()),
        check_token_hash: Some(hash_token(TOKEN)),
    };

    TestApp {
        router: create_router(state),
        notifier,
        store,
        _dir: dir,
    }
}

fn check_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/check")
        .header("X-Check-Token", TOKEN)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_check_match_sends_one_alert() {
    let site = serve_event_site().await;
    let app = test_app(
        PersistedConfig {
            url: format!("{}/events", site),
            keywords: vec!["sale".to_string(), "concert".to_string()],
        },
        mail_env(),
        RecordingNotifier::default(),
    )
    .await;

    let response = app.router.oneshot(check_request("")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: CheckResponse = read_json(response).await;
    assert_eq!(body.status, "success");
    assert_eq!(body.found_keywords, vec!["sale"]);
    assert!(body.notified);
    assert_eq!(body.message, "Keywords found and email sent: sale");

    let alerts = app.notifier.alerts.lock().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].0, vec!["sale".to_string()]);
    assert_eq!(alerts[0].1, format!("{}/events", site));
}

#[tokio::test]
async fn test_check_no_match_is_info() {
    let site = serve_event_site().await;
    let app = test_app(
        PersistedConfig {
            url: format!("{}/events", site),
            keywords: vec!["jazz".to_string()],
        },
        mail_env(),
        RecordingNotifier::default(),
    )
    .await;

    let response = app.router.oneshot(check_request("")).await.unwrap();
    let body: CheckResponse = read_json(response).await;

    assert_eq!(body.status, "info");
    assert!(body.found_keywords.is_empty());
    assert!(app.notifier.alerts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_check_fetch_failure_is_error() {
    let site = serve_event_site().await;
    let app = test_app(
        PersistedConfig {
            url: format!("{}/missing", site),
            keywords: vec!["sale".to_string()],
        },
        mail_env(),
        RecordingNotifier::default(),
    )
    .await;

    let response = app.router.oneshot(check_request("")).await.unwrap();
    let body: CheckResponse = read_json(response).await;

    assert_eq!(body.status, "error");
    assert_eq!(body.error_kind.as_deref(), Some("fetch_error"));
    assert!(body.message.contains("HTTP 404"));
    assert!(app.notifier.alerts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_check_notify_failure_is_warning() {
    let site = serve_event_site().await;
    let app = test_app(
        PersistedConfig {
            url: format!("{}/events", site),
            keywords: vec!["market".to_string()],
        },
        mail_env(),
        RecordingNotifier {
            fail: true,
            ..Default::default()
        },
    )
    .await;

    let response = app.router.oneshot(check_request("")).await.unwrap();
    let body: CheckResponse = read_json(response).await;

    assert_eq!(body.status, "warning");
    assert_eq!(body.found_keywords, vec!["market"]);
    assert!(!body.notified);
    assert!(body.notify_error.unwrap().contains("authentication failed"));
}

#[tokio::test]
async fn test_check_request_overrides_config() {
    let site = serve_event_site().await;
    let app = test_app(
        PersistedConfig {
            url: format!("{}/missing", site),
            keywords: vec!["jazz".to_string()],
        },
        mail_env(),
        RecordingNotifier::default(),
    )
    .await;

    let body = serde_json::json!({
        "url": format!("{}/events", site),
        "keywords": ["farmers"],
    });
    let response = app
        .router
        .oneshot(check_request(&body.to_string()))
        .await
        .unwrap();
    let body: CheckResponse = read_json(response).await;

    assert_eq!(body.status, "success");
    assert_eq!(body.found_keywords, vec!["farmers"]);
}

#[tokio::test]
async fn test_check_without_keywords_is_config_error() {
    let app = test_app(
        PersistedConfig {
            url: "http://127.0.0.1:9/".to_string(),
            keywords: Vec::new(),
        },
        mail_env(),
        RecordingNotifier::default(),
    )
    .await;

    let response = app.router.oneshot(check_request("")).await.unwrap();
    let body: CheckResponse = read_json(response).await;

    assert_eq!(body.status, "error");
    assert_eq!(body.error_kind.as_deref(), Some("config_error"));
    assert!(body.message.contains("keywords"));
}

#[tokio::test]
async fn test_check_without_mail_settings_is_config_error() {
    let app = test_app(
        PersistedConfig {
            url: "http://127.0.0.1:9/".to_string(),
            keywords: vec!["sale".to_string()],
        },
        EnvOverrides::default(),
        RecordingNotifier::default(),
    )
    .await;

    let response = app.router.oneshot(check_request("")).await.unwrap();
    let body: CheckResponse = read_json(response).await;

    assert_eq!(body.error_kind.as_deref(), Some("config_error"));
    assert!(body.message.contains("sender_email"));
}

#[tokio::test]
async fn test_check_requires_token() {
    let app = test_app(PersistedConfig::default(), mail_env(), RecordingNotifier::default()).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/check")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/check?token=wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_check_accepts_query_token() {
    let site = serve_event_site().await;
    let app = test_app(
        PersistedConfig {
            url: format!("{}/events", site),
            keywords: vec!["sale".to_string()],
        },
        mail_env(),
        RecordingNotifier::default(),
    )
    .await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/check?token={}", TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_check_rejects_malformed_body() {
    let app = test_app(PersistedConfig::default(), mail_env(), RecordingNotifier::default()).await;

    let response = app.router.oneshot(check_request("{ nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_config_then_read_back() {
    let app = test_app(PersistedConfig::default(), mail_env(), RecordingNotifier::default()).await;

    let payload = serde_json::json!({
        "url": "  https://events.example.com/calendar ",
        "keywords": ["Sale", " sale", "concert", ""],
    });
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/config")
                .header("X-Check-Token", TOKEN)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let saved = app.store.load().await.unwrap();
    assert_eq!(saved.url, "https://events.example.com/calendar");
    assert_eq!(saved.keywords, vec!["Sale", "concert"]);

    let response = app
        .router
        .oneshot(Request::builder().uri("/config").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body: PersistedConfig = read_json(response).await;
    assert_eq!(body, saved);
}

#[tokio::test]
async fn test_update_config_rejects_invalid_url() {
    let app = test_app(PersistedConfig::default(), mail_env(), RecordingNotifier::default()).await;

    let payload = serde_json::json!({ "url": "not-a-valid-url", "keywords": ["sale"] });
    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/config")
                .header("X-Check-Token", TOKEN)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.store.load().await.unwrap(), PersistedConfig::default());
}

#[tokio::test]
async fn test_update_config_checks_token_before_body() {
    let app = test_app(PersistedConfig::default(), mail_env(), RecordingNotifier::default()).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/config")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/config")
                .header("X-Check-Token", TOKEN)
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.store.load().await.unwrap(), PersistedConfig::default());
}

#[tokio::test]
async fn test_status_reports_effective_config() {
    let env = EnvOverrides {
        default_url: "http://example.com".to_string(),
        ..mail_env()
    };
    let app = test_app(
        PersistedConfig {
            url: String::new(),
            keywords: vec!["sale".to_string()],
        },
        env,
        RecordingNotifier::default(),
    )
    .await;

    let response = app
        .router
        .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: StatusResponse = read_json(response).await;
    assert!(body.url_configured);
    assert!(body.keywords_configured);
    assert!(body.email_configured);
    assert_eq!(body.config.url, "http://example.com");
    assert_eq!(body.config.keywords, vec!["sale"]);
    assert_eq!(body.config.sender_email, "b***@example.com");
}

#[tokio::test]
async fn test_version_endpoint() {
    let app = test_app(PersistedConfig::default(), mail_env(), RecordingNotifier::default()).await;

    let response = app
        .router
        .oneshot(Request::builder().uri("/version").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: VersionResponse = read_json(response).await;
    assert_eq!(body.agent, "keyword-agent");
    assert_eq!(body.version, VERSION);
    assert_eq!(body.version.split('.').count(), 3);
}

#[tokio::test]
async fn test_unconfigured_token_refuses_checks() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path().join("config.json"));
    let fetcher = HttpFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(5)).unwrap();
    let state = AppState {
        loader: Arc::new(ConfigLoader::new(store, mail_env())),
        runner: CheckRunner::new(Arc::new(fetcher), Arc::new(RecordingNotifier::default())),
        check_token_hash: None,
    };

    let response = create_router(state)
        .oneshot(check_request(""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
