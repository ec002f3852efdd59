//! Store backend selection and retry policy configuration.

use serde::{Deserialize, Serialize};

/// Which ledger store adapter the server wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Direct PostgreSQL adapter.
    Postgres,
    /// Remote REST proxy adapter for the ledger.
    Remote,
}

/// Store layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Selected ledger backend.
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    /// Remote ledger proxy settings (used when `backend = "remote"`).
    #[serde(default)]
    pub remote: RemoteStoreConfig,
    /// Retry policy for idempotent reads.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            remote: RemoteStoreConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Remote ledger proxy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteStoreConfig {
    /// Base URL of the ledger proxy API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for RemoteStoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Bounded exponential backoff for idempotent reads at the store boundary.
///
/// Writes are never blindly retried; conditional updates make double
/// application impossible, so the caller decides whether to re-issue them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Initial backoff delay in milliseconds.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_backend() -> StoreBackend {
    StoreBackend::Postgres
}

fn default_base_url() -> String {
    "http://localhost:9090".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    50
}

fn default_max_delay() -> u64 {
    2000
}
