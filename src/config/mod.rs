//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EngineConfig (validated, immutable)
//!     → passed by reference to the server at startup
//! ```
//!
//! # Design Decisions
//! - Config is loaded once before the listener starts and never mutated;
//!   there is no reload path and no global/singleton state
//! - All fields have defaults so a minimal (or absent) config works
//! - Validation separates syntactic (serde) from semantic checks and
//!   reports every violation, not just the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::EngineConfig;
pub use schema::ListenerConfig;
pub use schema::TlsConfig;
pub use schema::WorkerPoolConfig;
