//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (non-privileged port, non-zero pool sizing)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: EngineConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::EngineConfig;

#[derive(Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Bind address is not `host:port`.
    InvalidBindAddress(String),
    /// Port outside the accepted 1024–65535 range.
    PortOutOfRange(u16),
    MaxConnectionsZero,
    BaseWorkersZero,
    MaxQueueZero,
    /// Cap below the base worker count makes growth meaningless.
    MaxWorkersBelowBase { base: usize, max: usize },
    ReadTimeoutZero,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(addr) => {
                write!(f, "Invalid bind address '{}'", addr)
            }
            ValidationError::PortOutOfRange(port) => {
                write!(f, "Port {} out of range (1024-65535)", port)
            }
            ValidationError::MaxConnectionsZero => write!(f, "max_connections must be at least 1"),
            ValidationError::BaseWorkersZero => write!(f, "base_workers must be at least 1"),
            ValidationError::MaxQueueZero => write!(f, "max_queue must be at least 1"),
            ValidationError::MaxWorkersBelowBase { base, max } => {
                write!(f, "max_workers ({}) is below base_workers ({})", max, base)
            }
            ValidationError::ReadTimeoutZero => write!(f, "read_secs must be at least 1"),
        }
    }
}

/// Check everything, collecting all violations.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.listener.bind_address.parse::<SocketAddr>() {
        Ok(addr) if addr.port() < 1024 => {
            errors.push(ValidationError::PortOutOfRange(addr.port()));
        }
        Ok(_) => {}
        Err(_) => {
            errors.push(ValidationError::InvalidBindAddress(
                config.listener.bind_address.clone(),
            ));
        }
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::MaxConnectionsZero);
    }
    if config.workers.base_workers == 0 {
        errors.push(ValidationError::BaseWorkersZero);
    }
    if config.workers.max_queue == 0 {
        errors.push(ValidationError::MaxQueueZero);
    }
    if config.workers.max_workers < config.workers.base_workers {
        errors.push(ValidationError::MaxWorkersBelowBase {
            base: config.workers.base_workers,
            max: config.workers.max_workers,
        });
    }
    if config.timeouts.read_secs == 0 {
        errors.push(ValidationError::ReadTimeoutZero);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
