//! Server wiring: bind, accept loop, graceful shutdown.
//!
//! # Data Flow
//! ```text
//! Listener accepts → (TLS handshake if configured) → session task spawned
//!     → session reads/screens → dispatch on the worker pool → write → close
//! Shutdown signal → acceptor closed → in-flight connections drained
//!     → worker pool joined
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_rustls::TlsAcceptor;

use crate::config::schema::{EngineConfig, LimitsConfig};
use crate::lifecycle::Shutdown;
use crate::net::{self, Listener, ListenerError, Stream, TlsError};
use crate::pool::WorkerPool;
use crate::routing::Router;
use crate::session::Session;

/// Error type for server startup.
#[derive(Debug)]
pub enum ServerError {
    Listener(ListenerError),
    Tls(TlsError),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Listener(e) => write!(f, "Listener setup failed: {}", e),
            ServerError::Tls(e) => write!(f, "TLS setup failed: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<ListenerError> for ServerError {
    fn from(e: ListenerError) -> Self {
        ServerError::Listener(e)
    }
}

impl From<TlsError> for ServerError {
    fn from(e: TlsError) -> Self {
        ServerError::Tls(e)
    }
}

/// The assembled engine: listener, optional TLS, router, worker pool.
pub struct Server {
    listener: Listener,
    tls: Option<TlsAcceptor>,
    router: Arc<Router>,
    pool: Arc<WorkerPool>,
    limits: LimitsConfig,
    read_timeout: Duration,
}

impl Server {
    /// Bind the listener, load TLS material if configured, and start the
    /// worker pool. The route table is frozen here: registration is over
    /// once the server owns the router.
    pub async fn bind(config: &EngineConfig, router: Router) -> Result<Self, ServerError> {
        let listener = Listener::bind(&config.listener).await?;

        let tls = match &config.listener.tls {
            Some(tls_config) => Some(net::load_acceptor(
                std::path::Path::new(&tls_config.cert_path),
                std::path::Path::new(&tls_config.key_path),
            )?),
            None => None,
        };

        let pool = Arc::new(WorkerPool::new(
            config.workers.base_workers,
            config.workers.max_queue,
            config.workers.max_workers,
            Duration::from_millis(config.workers.backpressure_timeout_ms),
        ));

        tracing::info!(
            routes = router.route_count(),
            tls = tls.is_some(),
            "Server ready"
        );

        Ok(Self {
            listener,
            tls,
            router: Arc::new(router),
            pool,
            limits: config.limits.clone(),
            read_timeout: Duration::from_secs(config.timeouts.read_secs),
        })
    }

    /// The bound address; reflects the real port when binding to port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Accept connections until the shutdown signal fires, then drain
    /// in-flight connections and join the worker pool.
    pub async fn serve(self, shutdown: &Shutdown) {
        let mut shutdown_rx = shutdown.subscribe();

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer, guard) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::error!(error = %e, "Accept failed");
                            continue;
                        }
                    };
                    self.spawn_connection(stream, peer, guard);
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Shutdown signal received; closing acceptor");
                    break;
                }
            }
        }

        // No new work past this point; let live sessions finish, then stop
        // the workers.
        self.listener.drain().await;
        let pool = Arc::clone(&self.pool);
        let _ = tokio::task::spawn_blocking(move || pool.shutdown()).await;
        tracing::info!("Server stopped");
    }

    fn spawn_connection(
        &self,
        stream: tokio::net::TcpStream,
        peer: SocketAddr,
        guard: net::ConnectionGuard,
    ) {
        let tls = self.tls.clone();
        let router = Arc::clone(&self.router);
        let pool = Arc::clone(&self.pool);
        let limits = self.limits.clone();
        let read_timeout = self.read_timeout;

        tokio::spawn(async move {
            let stream = match tls {
                Some(acceptor) => match acceptor.accept(stream).await {
                    Ok(tls_stream) => Stream::Tls(Box::new(tls_stream)),
                    Err(e) => {
                        tracing::warn!(
                            connection_id = guard.id(),
                            peer = %peer,
                            class = net::tls::classify_handshake_error(&e),
                            error = %e,
                            "TLS handshake failed"
                        );
                        return;
                    }
                },
                None => Stream::Plain(stream),
            };

            Session::new(stream, peer, guard.id(), router, pool, limits, read_timeout)
                .run()
                .await;
        });
    }
}
