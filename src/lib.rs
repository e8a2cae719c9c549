//! hearth: a from-scratch HTTP(S) server engine.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────┐
//!                    │                    ENGINE                       │
//!                    │                                                 │
//!   Client ─────────▶│  net/listener ──▶ net/tls ──▶ session           │
//!                    │   (accept,         (optional    (read with      │
//!                    │    conn limit)      handshake)   deadline)      │
//!                    │                                    │            │
//!                    │                                    ▼            │
//!                    │            security/screen ──▶ pool (workers)   │
//!                    │                                    │            │
//!                    │                                    ▼            │
//!   Client ◀─────────│  http/response ◀── routing (exact → dynamic,    │
//!                    │   (write, close)     params, handlers)          │
//!                    │                                                 │
//!                    │  cross-cutting: config · lifecycle · tracing    │
//!                    └────────────────────────────────────────────────┘
//! ```
//!
//! The application registers handlers with the [`routing::Router`] and hands
//! it to [`server::Server`]; it never touches sockets, threads, or timers.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod routing;

// Execution
pub mod pool;
pub mod server;
pub mod session;

// Cross-cutting concerns
pub mod lifecycle;
pub mod security;

pub use config::EngineConfig;
pub use http::{Method, Request, Response};
pub use lifecycle::Shutdown;
pub use pool::WorkerPool;
pub use routing::{Handler, ParameterSet, Router};
pub use server::Server;
