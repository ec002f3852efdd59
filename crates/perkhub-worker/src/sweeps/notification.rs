//! Notification retention sweep.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use perkhub_core::config::realtime::NotificationsConfig;
use perkhub_core::result::AppResult;
use perkhub_service::NotificationService;

use super::Sweep;

/// Deletes notifications past the retention window and trims each
/// recipient's inbox to the configured cap.
pub struct NotificationCleanupSweep {
    /// Notification inbox service.
    notifications: Arc<NotificationService>,
    /// Retention settings.
    config: NotificationsConfig,
}

impl NotificationCleanupSweep {
    /// Create a new notification cleanup sweep.
    pub fn new(notifications: Arc<NotificationService>, config: NotificationsConfig) -> Self {
        Self {
            notifications,
            config,
        }
    }
}

#[async_trait]
impl Sweep for NotificationCleanupSweep {
    fn name(&self) -> &'static str {
        "notification_cleanup"
    }

    async fn run(&self) -> AppResult<u64> {
        let deleted = self
            .notifications
            .cleanup(self.config.cleanup_after_days, Utc::now())
            .await?;
        let trimmed = self
            .notifications
            .trim(self.config.max_stored_per_recipient as i64)
            .await?;
        Ok(deleted + trimmed)
    }
}
