//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits, connection ids)
//!     → tls.rs (optional TLS handshake, plain/TLS stream unification)
//!     → Hand off to the session state machine
//! ```
//!
//! # Design Decisions
//! - Bounded accept (semaphore permits) prevents resource exhaustion
//! - TLS is optional and handled before the session ever sees the stream
//! - Each connection carries a process-unique id for log correlation

pub mod listener;
pub mod tls;

pub use listener::{ConnectionGuard, Listener, ListenerError};
pub use tls::{load_acceptor, Stream, TlsError};
