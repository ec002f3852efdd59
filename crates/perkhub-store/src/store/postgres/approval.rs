//! PostgreSQL adapter for [`ApprovalStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use perkhub_core::config::store::RetryConfig;
use perkhub_core::result::AppResult;
use perkhub_core::types::{ApprovalRequestId, CustomerId, ProgramId};
use perkhub_entity::approval::{ApprovalRequest, ApprovalStatus, NewApprovalRequest};
use perkhub_entity::notification::{NewNotification, Notification};

use crate::retry::with_read_retry;
use crate::store::ApprovalStore;

use super::storage_err;

const REQUEST_COLUMNS: &str = "id, notification_id, customer_id, business_id, kind, status, \
     payload, requested_at, responded_at, expires_at";

const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, business_id, kind, title, message, payload, reference_id, \
     requires_action, action_taken, is_read, created_at, read_at";

/// Direct sqlx implementation of [`ApprovalStore`].
#[derive(Debug, Clone)]
pub struct PgApprovalStore {
    pool: PgPool,
    retry: RetryConfig,
}

impl PgApprovalStore {
    pub fn new(pool: PgPool, retry: RetryConfig) -> Self {
        Self { pool, retry }
    }

    async fn query_find(&self, id: ApprovalRequestId) -> AppResult<Option<ApprovalRequest>> {
        sqlx::query_as::<_, ApprovalRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM approval_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to fetch approval request", e))
    }

    async fn query_pending(
        &self,
        customer_id: CustomerId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ApprovalRequest>> {
        sqlx::query_as::<_, ApprovalRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM approval_requests \
             WHERE customer_id = $1 AND status = 'pending' AND expires_at > $2 \
             ORDER BY requested_at DESC"
        ))
        .bind(customer_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to list pending approval requests", e))
    }
}

#[async_trait]
impl ApprovalStore for PgApprovalStore {
    async fn create_with_notification(
        &self,
        notification: &NewNotification,
        request: &NewApprovalRequest,
    ) -> AppResult<(Notification, ApprovalRequest)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_err("Failed to begin transaction", e))?;

        // The notification row references the request so clients can
        // answer straight from the inbox.
        let stored_notification = sqlx::query_as::<_, Notification>(&format!(
            "INSERT INTO notifications \
             (id, recipient_id, business_id, kind, title, message, payload, reference_id, requires_action) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(notification.recipient_id)
        .bind(notification.business_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(Json(&notification.payload))
        .bind(request.id.into_uuid())
        .bind(notification.requires_action)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| storage_err("Failed to create approval notification", e))?;

        let stored_request = sqlx::query_as::<_, ApprovalRequest>(&format!(
            "INSERT INTO approval_requests \
             (id, notification_id, customer_id, business_id, kind, status, payload, expires_at) \
             VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7) \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(request.id)
        .bind(stored_notification.id)
        .bind(request.customer_id)
        .bind(request.business_id)
        .bind(request.kind)
        .bind(Json(&request.payload))
        .bind(request.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| storage_err("Failed to create approval request", e))?;

        tx.commit()
            .await
            .map_err(|e| storage_err("Failed to commit transaction", e))?;

        Ok((stored_notification, stored_request))
    }

    async fn find(&self, id: ApprovalRequestId) -> AppResult<Option<ApprovalRequest>> {
        with_read_retry(&self.retry, "approval.find", || self.query_find(id)).await
    }

    async fn list_pending(
        &self,
        customer_id: CustomerId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ApprovalRequest>> {
        with_read_retry(&self.retry, "approval.list_pending", || {
            self.query_pending(customer_id, now)
        })
        .await
    }

    async fn has_live_enrollment_request(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM approval_requests \
             WHERE customer_id = $1 \
               AND kind = 'enrollment' \
               AND status = 'pending' \
               AND expires_at > $3 \
               AND payload->>'program_id' = $2::text",
        )
        .bind(customer_id)
        .bind(program_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to check for live enrollment request", e))?;

        Ok(count > 0)
    }

    async fn resolve(
        &self,
        id: ApprovalRequestId,
        approved: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ApprovalRequest>> {
        let status = if approved {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Rejected
        };

        // Conditional update: under a concurrent double response exactly
        // one statement matches the pending row.
        sqlx::query_as::<_, ApprovalRequest>(&format!(
            "UPDATE approval_requests \
             SET status = $2, responded_at = $3 \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to resolve approval request", e))
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE approval_requests \
             SET status = 'expired' \
             WHERE status = 'pending' AND expires_at <= $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to expire overdue approval requests", e))?;

        Ok(result.rows_affected())
    }
}
