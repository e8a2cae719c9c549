//! Request routing subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed request
//!     → router.rs (OPTIONS preflight → exact table → dynamic list)
//!     → pattern.rs (compiled `{name}` templates, first match wins)
//!     → params.rs (sanitize + validate extracted values)
//!     → handler.rs (raw or parametric handler fills the response)
//! ```
//!
//! # Design Decisions
//! - The route table is built at startup and read-only afterwards; dispatch
//!   needs no locking
//! - Exact matches always win over dynamic patterns
//! - Dynamic patterns are tried in registration order; the first full match
//!   wins, overlapping registrations included

pub mod handler;
pub mod params;
pub mod pattern;
pub mod router;

pub use handler::Handler;
pub use params::ParameterSet;
pub use pattern::RoutePattern;
pub use router::Router;
