//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the engine.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the server engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Listener configuration (bind address, connection cap, TLS).
    pub listener: ListenerConfig,

    /// Worker pool sizing and backpressure.
    pub workers: WorkerPoolConfig,

    /// Request size caps and the heuristic screen.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080"). The port must fall in
    /// 1024–65535; validation enforces this.
    pub bind_address: String,

    /// Optional TLS configuration. Absent means plain TCP.
    pub tls: Option<TlsConfig>,

    /// Maximum concurrent connections (accept backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            max_connections: 10_000,
        }
    }
}

/// TLS material for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate chain file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Worker pool sizing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Worker threads started eagerly.
    pub base_workers: usize,

    /// Maximum queued tasks before the pool grows or pushes back.
    pub max_queue: usize,

    /// Hard cap on worker threads, dynamic growth included.
    pub max_workers: usize,

    /// How long a submitter waits for queue room once the pool is at the
    /// cap, before the task is rejected.
    pub backpressure_timeout_ms: u64,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            base_workers: 8,
            max_queue: 100,
            max_workers: 20,
            backpressure_timeout_ms: 1_000,
        }
    }
}

/// Request size caps.
///
/// `screen_max_body_bytes` belongs to the heuristic screen and is
/// deliberately separate from (and normally larger than) `max_body_bytes`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request line + header block size, in bytes.
    pub max_header_bytes: usize,

    /// Maximum decoded body size, in bytes. Exceeding it is a 400.
    pub max_body_bytes: usize,

    /// The screen's own body cap. Exceeding it is a 403.
    pub screen_max_body_bytes: usize,

    /// User-Agent substrings that trip the screen.
    pub blocked_user_agents: Vec<String>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_header_bytes: 8 * 1024,
            max_body_bytes: 1024 * 1024,
            screen_max_body_bytes: 10 * 1024 * 1024,
            blocked_user_agents: Vec::new(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection-level read deadline: one full request must arrive within
    /// this many seconds of the connection being accepted.
    pub read_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { read_secs: 5 }
    }
}
