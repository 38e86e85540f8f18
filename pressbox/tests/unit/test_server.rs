//! HTTP surface tests

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use tokio_test::assert_ok;
use tower::ServiceExt;

use pressbox::app::options::ProvisionOptions;
use pressbox::sandbox::{EnvironmentState, LeaseRegistry};
use pressbox::server::{router, ServerState};
use progress_stream::{ConsumerState, EventKind, StreamConsumer};

use common::{db_env, fast_options, FakeProvider, SANDBOX_ID, SANDBOX_URL};

fn app_with(provider: Arc<FakeProvider>, leases: LeaseRegistry, options: ProvisionOptions) -> Router {
    router(Arc::new(ServerState::new(
        provider,
        leases,
        Arc::new(db_env()),
        options,
    )))
}

fn app(provider: Arc<FakeProvider>) -> Router {
    app_with(provider, LeaseRegistry::new(), fast_options())
}

fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read the whole progress stream through a consumer
async fn consume(response: axum::response::Response) -> StreamConsumer {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let mut consumer = StreamConsumer::new();
    consumer.feed(&bytes);
    consumer.close();
    consumer
}

#[tokio::test]
async fn test_health() {
    let response = app(Arc::new(FakeProvider::new()))
        .oneshot(request(Method::GET, "/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "pressbox");
}

#[tokio::test]
async fn test_sandbox_stream_reaches_ready() {
    let response = app(Arc::new(FakeProvider::new()))
        .oneshot(request(Method::GET, "/api/sandbox"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

    let consumer = consume(response).await;
    assert_eq!(
        consumer.state(),
        &ConsumerState::Ready {
            sandbox_url: SANDBOX_URL.to_string()
        }
    );

    let log = consumer.log();
    assert_eq!(log.len(), 8);
    assert!(log.windows(2).all(|pair| pair[0].step < pair[1].step));
    assert_eq!(log.iter().filter(|e| e.is_terminal()).count(), 1);
}

#[tokio::test]
async fn test_sandbox_stream_reports_failure() {
    let provider = Arc::new(FakeProvider::new().fail_command("dnf install", 1));
    let response = app(provider)
        .oneshot(request(Method::GET, "/api/sandbox"))
        .await
        .unwrap();

    // Failures travel in the stream, not the status line
    assert_eq!(response.status(), StatusCode::OK);

    let consumer = consume(response).await;
    let last = consumer.log().last().unwrap();
    assert_eq!(last.kind(), EventKind::Error);
    assert_eq!(last.step, 2);
    assert!(matches!(
        consumer.state(),
        ConsumerState::Failed { message } if message.starts_with("Error: runtime install failed")
    ));
}

#[tokio::test]
async fn test_invalid_options_abort_the_stream() {
    let mut options = fast_options();
    options.archive_url = "http://wordpress.org/latest.tar.gz".to_string();
    let provider = Arc::new(FakeProvider::new());

    let response = app_with(provider.clone(), LeaseRegistry::new(), options)
        .oneshot(request(Method::GET, "/api/sandbox"))
        .await
        .unwrap();

    let consumer = consume(response).await;
    assert_eq!(consumer.log().len(), 1);
    assert_eq!(consumer.log()[0].step, 0);
    assert_eq!(consumer.log()[0].kind(), EventKind::Error);
    assert!(provider.recorder.commands().is_empty());
}

#[tokio::test]
async fn test_teardown_refused_while_leased() {
    let leases = LeaseRegistry::new();
    let provider = Arc::new(FakeProvider::new().with_environment(SANDBOX_ID, EnvironmentState::Active));
    let _lease = assert_ok!(leases.acquire(SANDBOX_ID));

    let response = app_with(provider.clone(), leases.clone(), fast_options())
        .oneshot(request(Method::DELETE, &format!("/api/sandbox/{}", SANDBOX_ID)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(body_json(response).await["error"].is_string());
    assert!(provider.recorder.stopped.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_teardown_stops_active_sandbox() {
    let provider = Arc::new(FakeProvider::new().with_environment(SANDBOX_ID, EnvironmentState::Active));

    let response = app(provider.clone())
        .oneshot(request(Method::DELETE, &format!("/api/sandbox/{}", SANDBOX_ID)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], SANDBOX_ID);
    assert_eq!(body["outcome"], "stopped");
    assert_eq!(*provider.recorder.stopped.lock().unwrap(), vec![SANDBOX_ID]);
}

#[tokio::test]
async fn test_teardown_unknown_sandbox_is_idempotent() {
    let provider = Arc::new(FakeProvider::new());

    let response = app(provider.clone())
        .oneshot(request(Method::DELETE, "/api/sandbox/sbx_gone"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["outcome"], "already_stopped");
    assert!(provider.recorder.stopped.lock().unwrap().is_empty());
}
