//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Validate → Register routes → Bind server → Serve
//!
//! Shutdown:
//!     SIGINT/SIGTERM → broadcast → acceptor closed → connections drained
//!         → worker pool joined → exit
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accepting first, drain, then join workers
//! - Signals are translated to one internal broadcast event

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
