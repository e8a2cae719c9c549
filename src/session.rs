//! Per-connection state machine.
//!
//! # Data Flow
//! ```text
//! Accepted (TLS already handled by the server)
//!     → Reading   (one request under a single deadline)
//!     → Screening (heuristic filter, 403 on trip)
//!     → Routing/Handling (dispatched on the worker pool)
//!     → Writing   (one response, then close)
//! Any failure or the deadline firing aborts the connection.
//! ```
//!
//! # Design Decisions
//! - Exactly one read deadline per connection; firing it always tears the
//!   connection down, never retries
//! - No keep-alive: every request closes the socket after one response
//! - A panic inside dispatch is converted to a 500 at the worker boundary,
//!   so the client still gets a response

use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;
use tokio::time::timeout;

use crate::config::schema::LimitsConfig;
use crate::http::parser::{self, ParseError, ReadLimits};
use crate::http::{Request, Response};
use crate::net::Stream;
use crate::pool::WorkerPool;
use crate::routing::Router;
use crate::security::screen;

/// One accepted connection being driven to completion or abortion.
pub struct Session {
    stream: Stream,
    peer: SocketAddr,
    connection_id: u64,
    router: Arc<Router>,
    pool: Arc<WorkerPool>,
    limits: LimitsConfig,
    read_timeout: Duration,
}

impl Session {
    pub fn new(
        stream: Stream,
        peer: SocketAddr,
        connection_id: u64,
        router: Arc<Router>,
        pool: Arc<WorkerPool>,
        limits: LimitsConfig,
        read_timeout: Duration,
    ) -> Self {
        Self {
            stream,
            peer,
            connection_id,
            router,
            pool,
            limits,
            read_timeout,
        }
    }

    /// Drive the connection through read → screen → dispatch → write.
    pub async fn run(mut self) {
        let request = match self.read_request().await {
            Some(request) => request,
            None => return, // aborted; already logged where it happened
        };

        tracing::debug!(
            connection_id = self.connection_id,
            peer = %self.peer,
            method = %request.method_token,
            target = %request.target,
            "Request read"
        );

        if let Err(rejection) = screen::screen_request(&request, &self.limits) {
            tracing::warn!(
                connection_id = self.connection_id,
                peer = %self.peer,
                rule = rejection.rule,
                "Request rejected by screen"
            );
            let mut res = Response::new();
            res.error(403, "Forbidden");
            self.write_response(&res).await;
            return;
        }

        let response = self.dispatch(request).await;
        self.write_response(&response).await;
    }

    /// Reading phase. Returns None when the connection was aborted.
    async fn read_request(&mut self) -> Option<Request> {
        let read_limits = ReadLimits {
            max_header_bytes: self.limits.max_header_bytes,
            max_body_bytes: self.limits.max_body_bytes,
        };

        let result = timeout(
            self.read_timeout,
            parser::read_request(&mut self.stream, read_limits),
        )
        .await;

        let error = match result {
            Ok(Ok(request)) => return Some(request),
            Ok(Err(error)) => error,
            Err(_elapsed) => {
                tracing::warn!(
                    connection_id = self.connection_id,
                    peer = %self.peer,
                    timeout_secs = self.read_timeout.as_secs(),
                    "No request within read deadline; closing connection"
                );
                return None;
            }
        };

        match &error {
            ParseError::Eof => {
                tracing::debug!(
                    connection_id = self.connection_id,
                    peer = %self.peer,
                    "Connection closed cleanly by peer"
                );
            }
            ParseError::Io(e) => {
                tracing::error!(
                    connection_id = self.connection_id,
                    peer = %self.peer,
                    error = %e,
                    "Read failed"
                );
            }
            ParseError::UnexpectedEof => {
                // The peer is gone; a 400 would go nowhere.
                tracing::debug!(
                    connection_id = self.connection_id,
                    peer = %self.peer,
                    "Peer closed connection mid-request"
                );
            }
            ParseError::BodyTooLarge(_) => {
                tracing::warn!(
                    connection_id = self.connection_id,
                    peer = %self.peer,
                    "Request too large"
                );
                let mut res = Response::new();
                res.error(400, "Request too large");
                self.write_response(&res).await;
            }
            other => {
                tracing::debug!(
                    connection_id = self.connection_id,
                    peer = %self.peer,
                    error = %other,
                    "Malformed request"
                );
                let mut res = Response::new();
                res.error(400, "Malformed request");
                self.write_response(&res).await;
            }
        }
        None
    }

    /// Routing/Handling phase, executed on the worker pool so slow handler
    /// code never stalls the I/O threads.
    async fn dispatch(&self, request: Request) -> Response {
        let (tx, rx) = oneshot::channel();
        let router = Arc::clone(&self.router);
        let connection_id = self.connection_id;

        let accepted = self.pool.submit(move || {
            let response = match catch_unwind(AssertUnwindSafe(|| router.dispatch(&request))) {
                Ok(response) => response,
                Err(_) => {
                    tracing::error!(connection_id, "Handler panicked; responding 500");
                    Response::internal_error()
                }
            };
            let _ = tx.send(response);
        });

        if !accepted {
            tracing::warn!(
                connection_id = self.connection_id,
                peer = %self.peer,
                "Worker pool saturated; rejecting request"
            );
            return Response::at_capacity();
        }

        match rx.await {
            Ok(response) => response,
            // The worker sends unconditionally; this means the pool dropped
            // the task during shutdown.
            Err(_) => Response::internal_error(),
        }
    }

    /// Writing phase: encode, flush, shut the connection down.
    async fn write_response(&mut self, response: &Response) {
        if let Err(e) = self.stream.write_all(&response.to_bytes()).await {
            tracing::error!(
                connection_id = self.connection_id,
                peer = %self.peer,
                error = %e,
                "Failed to write response"
            );
            return;
        }
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(
                connection_id = self.connection_id,
                error = %e,
                "Socket shutdown failed"
            );
        }
        tracing::debug!(
            connection_id = self.connection_id,
            peer = %self.peer,
            status = response.status(),
            "Response sent, connection closed"
        );
    }
}
