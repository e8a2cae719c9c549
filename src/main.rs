//! hearth server binary.
//!
//! Loads configuration, registers the demonstration routes, and serves until
//! SIGINT/SIGTERM. Real applications link the library, build their own
//! `Router`, and hand it to `Server::bind` the same way.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hearth::config::loader;
use hearth::lifecycle::{signals, Shutdown};
use hearth::routing::{Handler, Router};
use hearth::{Method, Server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hearth=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("hearth v0.1.0 starting");

    let config = match std::env::args().nth(1) {
        Some(path) => loader::load_config(Path::new(&path))?,
        None => loader::default_config()?,
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        read_timeout_secs = config.timeouts.read_secs,
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    let mut router = Router::new();
    router.register(
        Method::Get,
        "/ping",
        Handler::raw(|_req, res| {
            res.json(200, &json!({ "status": "ok" }));
        }),
    )?;
    router.register(
        Method::Get,
        "/version",
        Handler::raw(|_req, res| {
            res.json(200, &json!({ "name": "hearth", "version": env!("CARGO_PKG_VERSION") }));
        }),
    )?;

    let server = Server::bind(&config, router).await?;
    tracing::info!(address = %server.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let signal_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        signal_shutdown.trigger();
    });

    server.serve(&shutdown).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
