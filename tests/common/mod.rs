//! Shared helpers for end-to-end tests: start an engine on an ephemeral
//! port and talk raw HTTP/1.1 over a TcpStream.

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use hearth::config::EngineConfig;
use hearth::lifecycle::Shutdown;
use hearth::routing::{Handler, Router};
use hearth::{Method, Server};

/// Bind on 127.0.0.1:0 and serve in the background.
///
/// The returned `Shutdown` must be kept alive for the duration of the test;
/// dropping it stops the server.
pub async fn start_engine(mut config: EngineConfig, router: Router) -> (SocketAddr, Arc<Shutdown>) {
    config.listener.bind_address = "127.0.0.1:0".to_string();
    let server = Server::bind(&config, router)
        .await
        .expect("engine failed to bind");
    let addr = server.local_addr().expect("no local addr");

    let shutdown = Arc::new(Shutdown::new());
    let serve_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move {
        server.serve(&serve_shutdown).await;
    });

    (addr, shutdown)
}

/// A router with the canonical demo route: `GET /users/{id}` echoing the
/// extracted parameters as JSON.
pub fn users_router() -> Router {
    let mut router = Router::new();
    router
        .register(
            Method::Get,
            "/users/{id}",
            Handler::parametric(|params, res| {
                res.json(200, &json!({ "id": params.get("id").unwrap_or_default() }));
            }),
        )
        .expect("route registration failed");
    router
}

/// Write one raw request, read the full response until the server closes.
pub async fn raw_roundtrip(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect failed");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write failed");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read failed");
    response
}

pub fn get(path: &str) -> String {
    format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n")
}

pub fn status_of(response: &str) -> u16 {
    response
        .split(' ')
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("malformed response: {response:?}"))
}

pub fn body_of(response: &str) -> &str {
    response.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or("")
}
