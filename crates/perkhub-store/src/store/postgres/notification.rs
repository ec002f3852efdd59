//! PostgreSQL adapter for [`NotificationStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use perkhub_core::config::store::RetryConfig;
use perkhub_core::result::AppResult;
use perkhub_core::types::{NotificationId, PageRequest, PageResponse};
use perkhub_entity::notification::{NewNotification, Notification};

use crate::retry::with_read_retry;
use crate::store::NotificationStore;

use super::storage_err;

const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, business_id, kind, title, message, payload, reference_id, \
     requires_action, action_taken, is_read, created_at, read_at";

/// Direct sqlx implementation of [`NotificationStore`].
#[derive(Debug, Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
    retry: RetryConfig,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool, retry: RetryConfig) -> Self {
        Self { pool, retry }
    }

    async fn query_by_recipient(
        &self,
        recipient_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE recipient_id = $1")
                .bind(recipient_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| storage_err("Failed to count notifications", e))?;

        let items = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE recipient_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(recipient_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to fetch notifications", e))?;

        Ok(PageResponse::new(items, page.page, page.page_size, total as u64))
    }

    async fn query_unread(&self, recipient_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to count unread notifications", e))
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn create(&self, new: &NewNotification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(&format!(
            "INSERT INTO notifications \
             (id, recipient_id, business_id, kind, title, message, payload, reference_id, requires_action) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.recipient_id)
        .bind(new.business_id)
        .bind(new.kind)
        .bind(&new.title)
        .bind(&new.message)
        .bind(Json(&new.payload))
        .bind(new.reference_id)
        .bind(new.requires_action)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to create notification", e))
    }

    async fn find_by_recipient(
        &self,
        recipient_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        with_read_retry(&self.retry, "notification.find_by_recipient", || {
            self.query_by_recipient(recipient_id, page)
        })
        .await
    }

    async fn count_unread(&self, recipient_id: Uuid) -> AppResult<i64> {
        with_read_retry(&self.retry, "notification.count_unread", || {
            self.query_unread(recipient_id)
        })
        .await
    }

    async fn mark_read(
        &self,
        id: NotificationId,
        recipient_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = TRUE, read_at = $3 \
             WHERE id = $1 AND recipient_id = $2 AND is_read = FALSE",
        )
        .bind(id)
        .bind(recipient_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to mark notification read", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, recipient_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = TRUE, read_at = $2 \
             WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(recipient_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to mark notifications read", e))?;

        Ok(result.rows_affected())
    }

    async fn mark_action_taken(&self, id: NotificationId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET action_taken = TRUE \
             WHERE id = $1 AND requires_action = TRUE AND action_taken = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to mark notification action taken", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_err("Failed to delete old notifications", e))?;

        Ok(result.rows_affected())
    }

    async fn trim_per_recipient(&self, keep: i64) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM notifications \
             WHERE id IN ( \
                 SELECT id FROM ( \
                     SELECT id, ROW_NUMBER() OVER ( \
                         PARTITION BY recipient_id ORDER BY created_at DESC \
                     ) AS rank \
                     FROM notifications \
                 ) ranked \
                 WHERE rank > $1 \
             )",
        )
        .bind(keep)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to trim notifications", e))?;

        Ok(result.rows_affected())
    }
}
