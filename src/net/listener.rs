//! TCP listener with accept backpressure.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Enforce max_connections via semaphore permits
//! - Tag each connection with a process-unique id for tracing

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::config::ListenerConfig;

/// Uniqueness is all that matters for connection ids, so relaxed ordering
/// is sufficient.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind(std::io::Error),
    /// Failed to accept a connection.
    Accept(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::Accept(e) => write!(f, "Failed to accept: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {}

/// A bounded TCP listener.
///
/// A semaphore enforces `max_connections`: when every permit is out, accept
/// waits until a connection finishes instead of piling up sessions.
pub struct Listener {
    inner: TcpListener,
    connection_limit: Arc<Semaphore>,
    max_connections: usize,
}

impl Listener {
    /// Bind to the configured address with connection limits.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
            ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;

        let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            max_connections = config.max_connections,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
            max_connections: config.max_connections,
        })
    }

    /// Accept a new connection, respecting the connection limit.
    ///
    /// Waits when the limit has been reached. The returned guard holds the
    /// connection's permit and id; dropping it releases the slot.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionGuard), ListenerError> {
        // Acquire the permit first so a flood blocks here, not in sessions.
        let permit = self
            .connection_limit
            .clone()
            .acquire_owned()
            .await
            .expect("connection semaphore closed");

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;
        let id = CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            peer_addr = %addr,
            connection_id = id,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok((
            stream,
            addr,
            ConnectionGuard {
                _permit: permit,
                id,
            },
        ))
    }

    /// The local address this listener is bound to. Useful when binding to
    /// port 0 in tests.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Wait until every accepted connection has finished.
    pub async fn drain(&self) {
        let _all = self
            .connection_limit
            .acquire_many(self.max_connections as u32)
            .await
            .expect("connection semaphore closed");
    }

    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }
}

/// Guard for one connection slot: permit plus tracing id.
///
/// Dropping it releases the slot even if the connection handler panics.
#[derive(Debug)]
pub struct ConnectionGuard {
    _permit: tokio::sync::OwnedSemaphorePermit,
    id: u64,
}

impl ConnectionGuard {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        tracing::trace!(connection_id = self.id, "Connection closed");
    }
}
