//! Upstream forwarding tests against a real upstream on a local port.

mod common;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode, Uri},
    response::IntoResponse,
    routing::any,
    Json, Router,
};
use common::{body_json, test_state, FORWARD_BODY_LIMIT};
use habit_gateway::config::UpstreamConfig;
use habit_gateway::routes::{create_router, RouteGroups};
use serde_json::json;
use tokio::net::TcpListener;
use tower::ServiceExt; // for .oneshot()

/// Echoes what it received; `/missing` answers 404 in its own format
async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let status = if uri.path() == "/missing" {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };

    let received = json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "body": String::from_utf8_lossy(&body),
        "cookie": headers.get(header::COOKIE).and_then(|v| v.to_str().ok()),
    });

    (status, [("x-upstream", "echo")], Json(received))
}

async fn spawn_upstream() -> String {
    let app = Router::new()
        .route("/", any(echo))
        .route("/{*rest}", any(echo));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn gateway() -> Router {
    let upstream = spawn_upstream().await;
    let config = UpstreamConfig {
        habits_url: upstream.clone(),
        auth_url: format!("{}/auth", upstream),
        // Nothing listens on port 1
        stats_url: "http://127.0.0.1:1".to_string(),
    };

    create_router(test_state(), RouteGroups::upstreams(&config, FORWARD_BODY_LIMIT).unwrap())
}

#[tokio::test]
async fn test_forwards_method_path_query_body_and_cookies() {
    let request = Request::builder()
        .method(Method::PATCH)
        .uri("/api/habits/42/logs?date=2024-01-01")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, "session=abc123")
        .body(Body::from(r#"{"done":true}"#))
        .unwrap();

    let response = gateway().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-upstream").unwrap(), "echo");
    assert_eq!(
        body_json(response).await,
        json!({
            "method": "PATCH",
            "path": "/42/logs",
            "query": "date=2024-01-01",
            "body": r#"{"done":true}"#,
            "cookie": "session=abc123",
        })
    );
}

#[tokio::test]
async fn test_forwards_under_upstream_base_path() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"email":"a@b.c"}"#))
        .unwrap();

    let response = gateway().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["path"], "/auth/login");
    assert_eq!(body["method"], "POST");
}

#[tokio::test]
async fn test_prefix_root_is_forwarded() {
    let request = Request::builder()
        .uri("/api/habits")
        .body(Body::empty())
        .unwrap();

    let response = gateway().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["path"], "/");
}

#[tokio::test]
async fn test_prefix_root_with_trailing_slash_is_forwarded() {
    let request = Request::builder()
        .uri("/api/habits/?archived=false")
        .body(Body::empty())
        .unwrap();

    let response = gateway().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["path"], "/");
    assert_eq!(body["query"], "archived=false");
}

#[tokio::test]
async fn test_mount_prefix_is_case_insensitive() {
    let request = Request::builder()
        .uri("/API/Habits/7")
        .body(Body::empty())
        .unwrap();

    let response = gateway().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["path"], "/7");
}

#[tokio::test]
async fn test_oversized_forward_body_is_413_envelope() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/habits/import")
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(vec![b'x'; FORWARD_BODY_LIMIT * 2]))
        .unwrap();

    let response = gateway().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        body_json(response).await,
        json!({ "error": { "message": "request entity too large", "status": 413 } })
    );
}

#[tokio::test]
async fn test_forward_body_within_limit_is_sent() {
    let csv = "name,done\nRead,true\n";
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/habits/import")
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(csv))
        .unwrap();

    let response = gateway().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["body"], csv);
}

#[tokio::test]
async fn test_upstream_errors_are_relayed_verbatim() {
    let request = Request::builder()
        .uri("/api/habits/missing")
        .body(Body::empty())
        .unwrap();

    let response = gateway().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["path"], "/missing");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_unreachable_upstream_is_502_envelope() {
    let request = Request::builder()
        .uri("/api/stats/weekly")
        .body(Body::empty())
        .unwrap();

    let response = gateway().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["status"], 502);
    assert!(body["error"]["message"].as_str().unwrap().starts_with("Upstream request failed"));
}

#[tokio::test]
async fn test_health_does_not_touch_upstreams() {
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();

    let response = gateway().await.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "status": "ok", "message": "Server is running" })
    );
}
