//! Approval request entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use perkhub_core::types::{ApprovalRequestId, BusinessId, CustomerId, NotificationId};

use super::kind::ApprovalKind;
use super::payload::ApprovalPayload;
use super::status::ApprovalStatus;

/// A pending decision owned by a customer.
///
/// Kept forever for audit; resolved or expired requests are excluded from
/// pending queries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApprovalRequest {
    /// Unique request identifier (the opaque token shown to clients).
    pub id: ApprovalRequestId,
    /// The notification created alongside this request.
    pub notification_id: NotificationId,
    /// The customer who must decide.
    pub customer_id: CustomerId,
    /// The requesting business.
    pub business_id: BusinessId,
    /// What is being approved.
    pub kind: ApprovalKind,
    /// Resolution state.
    pub status: ApprovalStatus,
    /// Structured request payload.
    pub payload: Json<ApprovalPayload>,
    /// When the request was created.
    pub requested_at: DateTime<Utc>,
    /// When the customer answered, if they have.
    pub responded_at: Option<DateTime<Utc>>,
    /// Hard deadline after which the request is not actionable.
    pub expires_at: DateTime<Utc>,
}

impl ApprovalRequest {
    /// Whether the request has lapsed, regardless of stored status.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether the request can be answered right now.
    pub fn is_actionable_at(&self, now: DateTime<Utc>) -> bool {
        self.status.is_pending() && !self.is_expired_at(now)
    }
}

/// Parameters for creating a new approval request.
///
/// The id is generated by the caller so the companion notification can
/// reference the request before either row exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewApprovalRequest {
    /// Pre-generated request identifier.
    pub id: ApprovalRequestId,
    /// The customer who must decide.
    pub customer_id: CustomerId,
    /// The requesting business.
    pub business_id: BusinessId,
    /// What is being approved.
    pub kind: ApprovalKind,
    /// Structured request payload.
    pub payload: ApprovalPayload,
    /// Hard deadline.
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use perkhub_core::types::ProgramId;

    fn request(status: ApprovalStatus, expires_in: Duration) -> ApprovalRequest {
        let now = Utc::now();
        ApprovalRequest {
            id: ApprovalRequestId::new(),
            notification_id: NotificationId::new(),
            customer_id: CustomerId::new(),
            business_id: BusinessId::new(),
            kind: ApprovalKind::Enrollment,
            status,
            payload: Json(ApprovalPayload::Enrollment {
                program_id: ProgramId::new(),
                program_name: None,
            }),
            requested_at: now,
            responded_at: None,
            expires_at: now + expires_in,
        }
    }

    #[test]
    fn test_pending_unexpired_is_actionable() {
        let req = request(ApprovalStatus::Pending, Duration::days(7));
        assert!(req.is_actionable_at(Utc::now()));
    }

    #[test]
    fn test_expired_pending_is_not_actionable() {
        let req = request(ApprovalStatus::Pending, Duration::seconds(-1));
        assert!(!req.is_actionable_at(Utc::now()));
    }

    #[test]
    fn test_resolved_is_not_actionable() {
        let req = request(ApprovalStatus::Approved, Duration::days(7));
        assert!(!req.is_actionable_at(Utc::now()));
    }
}
