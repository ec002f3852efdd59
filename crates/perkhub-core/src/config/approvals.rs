//! Approval workflow configuration.

use serde::{Deserialize, Serialize};

/// Approval request lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalsConfig {
    /// Days until a pending approval request expires.
    #[serde(default = "default_expiry_days")]
    pub expiry_days: i64,
}

impl Default for ApprovalsConfig {
    fn default() -> Self {
        Self {
            expiry_days: default_expiry_days(),
        }
    }
}

fn default_expiry_days() -> i64 {
    7
}
