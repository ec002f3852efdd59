//! Real-time fan-out configuration.

use serde::{Deserialize, Serialize};

/// Real-time delivery engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Maximum live connections per recipient.
    #[serde(default = "default_max_connections_per_recipient")]
    pub max_connections_per_recipient: usize,
    /// Internal channel buffer size per connection.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Notification retention settings.
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_connections_per_recipient: default_max_connections_per_recipient(),
            channel_buffer_size: default_channel_buffer(),
            notifications: NotificationsConfig::default(),
        }
    }
}

/// Stored-notification retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Maximum stored notifications per recipient.
    #[serde(default = "default_max_stored")]
    pub max_stored_per_recipient: u64,
    /// Number of days after which stored notifications are cleaned up.
    #[serde(default = "default_cleanup_days")]
    pub cleanup_after_days: u32,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            max_stored_per_recipient: default_max_stored(),
            cleanup_after_days: default_cleanup_days(),
        }
    }
}

fn default_max_connections_per_recipient() -> usize {
    5
}

fn default_channel_buffer() -> usize {
    256
}

fn default_max_stored() -> u64 {
    1000
}

fn default_cleanup_days() -> u32 {
    90
}
