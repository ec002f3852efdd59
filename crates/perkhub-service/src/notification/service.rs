//! Notification inbox CRUD.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use perkhub_core::error::AppError;
use perkhub_core::result::AppResult;
use perkhub_core::types::{NotificationId, PageRequest, PageResponse};
use perkhub_entity::notification::{NewNotification, Notification};
use perkhub_store::NotificationStore;

/// Manages the persisted notification inbox.
///
/// Rows are the at-least-once delivery channel; live fan-out is a
/// separate best-effort concern handled by the event sink.
#[derive(Clone)]
pub struct NotificationService {
    /// Notification store.
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Persist a notification row.
    pub async fn notify(&self, new: NewNotification) -> AppResult<Notification> {
        let notification = self.store.create(&new).await?;
        info!(
            notification_id = %notification.id,
            recipient_id = %notification.recipient_id,
            kind = notification.kind.as_str(),
            "Notification recorded"
        );
        Ok(notification)
    }

    /// List a recipient's notifications, newest first.
    pub async fn list(
        &self,
        recipient_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        self.store.find_by_recipient(recipient_id, &page).await
    }

    /// Count a recipient's unread notifications.
    pub async fn unread_count(&self, recipient_id: Uuid) -> AppResult<i64> {
        self.store.count_unread(recipient_id).await
    }

    /// Mark one notification read.
    pub async fn mark_read(&self, recipient_id: Uuid, id: NotificationId) -> AppResult<()> {
        let updated = self.store.mark_read(id, recipient_id, Utc::now()).await?;
        if !updated {
            return Err(AppError::not_found("Notification not found or already read"));
        }
        Ok(())
    }

    /// Mark all of a recipient's notifications read.
    pub async fn mark_all_read(&self, recipient_id: Uuid) -> AppResult<u64> {
        let updated = self.store.mark_all_read(recipient_id, Utc::now()).await?;
        info!(recipient_id = %recipient_id, updated, "Marked all notifications read");
        Ok(updated)
    }

    /// Record that the action behind an actionable notification has been
    /// taken. Idempotent: re-marking is a no-op.
    pub async fn mark_action_taken(&self, id: NotificationId) -> AppResult<()> {
        self.store.mark_action_taken(id).await?;
        Ok(())
    }

    /// Delete notifications older than the retention window. Used by the
    /// cleanup sweep.
    pub async fn cleanup(&self, retention_days: u32, now: DateTime<Utc>) -> AppResult<u64> {
        let cutoff = now - Duration::days(i64::from(retention_days));
        let deleted = self.store.delete_older_than(cutoff).await?;
        if deleted > 0 {
            info!(deleted, retention_days, "Deleted old notifications");
        }
        Ok(deleted)
    }

    /// Trim each recipient's inbox down to the configured cap. Used by
    /// the cleanup sweep.
    pub async fn trim(&self, keep_per_recipient: i64) -> AppResult<u64> {
        let deleted = self.store.trim_per_recipient(keep_per_recipient).await?;
        if deleted > 0 {
            info!(deleted, keep_per_recipient, "Trimmed oversized inboxes");
        }
        Ok(deleted)
    }
}
