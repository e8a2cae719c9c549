//! End-to-end tests over real sockets: dispatch, validation, preflight,
//! read deadline, size caps, and worker-pool saturation.

use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use hearth::config::EngineConfig;
use hearth::routing::{Handler, Router};
use hearth::Method;

mod common;
use common::{body_of, get, raw_roundtrip, start_engine, status_of, users_router};

#[tokio::test]
async fn dynamic_route_end_to_end() {
    let (addr, _shutdown) = start_engine(EngineConfig::default(), users_router()).await;

    let ok = raw_roundtrip(addr, &get("/users/17")).await;
    assert_eq!(status_of(&ok), 200);
    assert_eq!(body_of(&ok), r#"{"id":"17"}"#);

    let invalid = raw_roundtrip(addr, &get("/users/abc")).await;
    assert_eq!(status_of(&invalid), 400);

    let missing = raw_roundtrip(addr, &get("/users")).await;
    assert_eq!(status_of(&missing), 404);
    assert_eq!(body_of(&missing), r#"{"message":"Route not found"}"#);
}

#[tokio::test]
async fn options_preflight_carries_cors_headers() {
    let (addr, _shutdown) = start_engine(EngineConfig::default(), users_router()).await;

    let response = raw_roundtrip(
        addr,
        "OPTIONS /no/such/route HTTP/1.1\r\nHost: localhost\r\n\r\n",
    )
    .await;
    assert_eq!(status_of(&response), 204);
    assert!(response.contains("Access-Control-Allow-Origin: *"));
    assert!(response.contains("Access-Control-Allow-Methods: GET, POST, PUT, DELETE, PATCH, OPTIONS, HEAD"));
    assert!(response.contains("Access-Control-Allow-Headers: Content-Type, Authorization"));
    assert_eq!(body_of(&response), "");
}

#[tokio::test]
async fn unsupported_verb_returns_405() {
    let (addr, _shutdown) = start_engine(EngineConfig::default(), users_router()).await;

    let response = raw_roundtrip(addr, "TRACE /users/1 HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert_eq!(status_of(&response), 405);
}

#[tokio::test]
async fn script_marker_in_target_is_screened() {
    let (addr, _shutdown) = start_engine(EngineConfig::default(), users_router()).await;

    let response =
        raw_roundtrip(addr, &get("/users/1<script>alert(1)</script>")).await;
    assert_eq!(status_of(&response), 403);
}

#[tokio::test]
async fn oversized_body_is_rejected_with_400() {
    let mut config = EngineConfig::default();
    config.limits.max_body_bytes = 64;
    let (addr, _shutdown) = start_engine(config, users_router()).await;

    let body = "x".repeat(256);
    let request = format!(
        "POST /users/1 HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let response = raw_roundtrip(addr, &request).await;
    assert_eq!(status_of(&response), 400);
    assert_eq!(body_of(&response), r#"{"message":"Request too large"}"#);
}

#[tokio::test]
async fn silent_client_is_closed_at_the_read_deadline() {
    let mut config = EngineConfig::default();
    config.timeouts.read_secs = 1;
    let (addr, _shutdown) = start_engine(config, users_router()).await;

    // One connection that never sends a byte...
    let mut silent = TcpStream::connect(addr).await.unwrap();

    // ...must not affect a concurrent well-behaved connection.
    let response = raw_roundtrip(addr, &get("/users/5")).await;
    assert_eq!(status_of(&response), 200);

    // The silent connection is closed by the server once the deadline fires.
    let mut buf = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), silent.read_to_end(&mut buf)).await;
    assert!(matches!(read, Ok(Ok(0))), "expected server-side close, got {read:?}");
}

#[tokio::test]
async fn saturated_pool_returns_503() {
    let mut config = EngineConfig::default();
    config.workers.base_workers = 1;
    config.workers.max_queue = 1;
    config.workers.max_workers = 1;
    config.workers.backpressure_timeout_ms = 50;

    let mut router = Router::new();
    router
        .register(
            Method::Get,
            "/slow",
            Handler::raw(|_req, res| {
                // Worker threads may block; that is what they are for.
                std::thread::sleep(Duration::from_secs(2));
                res.json(200, &json!({ "done": true }));
            }),
        )
        .unwrap();

    let (addr, _shutdown) = start_engine(config, router).await;

    // Occupy the only worker.
    let first = tokio::spawn(async move { raw_roundtrip(addr, &get("/slow")).await });
    tokio::time::sleep(Duration::from_millis(300)).await;

    // Fill the queue.
    let second = tokio::spawn(async move { raw_roundtrip(addr, &get("/slow")).await });
    tokio::time::sleep(Duration::from_millis(300)).await;

    // Queue full, cap reached: this one must be rejected after the
    // backpressure timeout, long before any slow handler finishes.
    let rejected = raw_roundtrip(addr, &get("/slow")).await;
    assert_eq!(status_of(&rejected), 503);
    assert_eq!(body_of(&rejected), r#"{"error":"Server is at capacity"}"#);

    let first = first.await.unwrap();
    assert_eq!(status_of(&first), 200);
    let second = second.await.unwrap();
    assert_eq!(status_of(&second), 200);
}

#[tokio::test]
async fn parametric_body_gate_end_to_end() {
    let mut router = Router::new();
    router
        .register(
            Method::Post,
            "/users/{id}",
            Handler::parametric(|params, res| {
                res.json(
                    201,
                    &json!({
                        "id": params.get("id").unwrap_or_default(),
                        "received": params.get("body").is_some(),
                    }),
                );
            }),
        )
        .unwrap();
    let (addr, _shutdown) = start_engine(EngineConfig::default(), router).await;

    let no_body = raw_roundtrip(
        addr,
        "POST /users/3 HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\n\r\n",
    )
    .await;
    assert_eq!(status_of(&no_body), 400);
    assert_eq!(body_of(&no_body), r#"{"message":"Empty request body."}"#);

    let bad_json = raw_roundtrip(
        addr,
        "POST /users/3 HTTP/1.1\r\nHost: localhost\r\nContent-Length: 9\r\n\r\n{not json",
    )
    .await;
    assert_eq!(status_of(&bad_json), 400);
    assert_eq!(body_of(&bad_json), r#"{"message":"Invalid JSON body."}"#);

    let ok = raw_roundtrip(
        addr,
        "POST /users/3 HTTP/1.1\r\nHost: localhost\r\nContent-Length: 14\r\n\r\n{\"name\":\"ada\"}",
    )
    .await;
    assert_eq!(status_of(&ok), 201);
    let body: serde_json::Value = serde_json::from_str(body_of(&ok)).unwrap();
    assert_eq!(body, json!({ "id": "3", "received": true }));
}

#[tokio::test]
async fn truncated_request_gets_no_response() {
    let (addr, _shutdown) = start_engine(EngineConfig::default(), users_router()).await;

    // Send half a request, then close our write side.
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /users/1 HTTP/1.1\r\nHost")
        .await
        .unwrap();
    stream.shutdown().await.unwrap();

    // The peer is gone from the server's point of view; it must close
    // without attempting to deliver an error response.
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    assert!(
        buf.is_empty(),
        "expected no response on a truncated request, got {:?}",
        String::from_utf8_lossy(&buf)
    );
}

#[tokio::test]
async fn malformed_request_line_gets_400() {
    let (addr, _shutdown) = start_engine(EngineConfig::default(), users_router()).await;

    let response = raw_roundtrip(addr, "NONSENSE\r\n\r\n").await;
    assert_eq!(status_of(&response), 400);
}
