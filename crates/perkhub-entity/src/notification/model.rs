//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use perkhub_core::types::{BusinessId, NotificationId};

use super::kind::NotificationKind;
use super::payload::NotificationPayload;

/// A notification shown in a recipient's inbox.
///
/// Rows are never deleted by the workflow (retention is handled by the
/// cleanup sweep); live delivery is a separate, best-effort concern.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// The recipient (customer or business user).
    pub recipient_id: Uuid,
    /// The business this notification concerns.
    pub business_id: BusinessId,
    /// Event kind.
    pub kind: NotificationKind,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Structured payload.
    pub payload: Json<NotificationPayload>,
    /// Related entity (approval request, card, transaction), if any.
    pub reference_id: Option<Uuid>,
    /// Whether the recipient must act on this notification.
    pub requires_action: bool,
    /// Whether the linked action has been taken.
    pub action_taken: bool,
    /// Whether the recipient has read this notification.
    pub is_read: bool,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the notification was read.
    pub read_at: Option<DateTime<Utc>>,
}

/// Parameters for creating a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    /// The recipient.
    pub recipient_id: Uuid,
    /// The business this notification concerns.
    pub business_id: BusinessId,
    /// Event kind.
    pub kind: NotificationKind,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Structured payload.
    pub payload: NotificationPayload,
    /// Related entity, if any.
    pub reference_id: Option<Uuid>,
    /// Whether the recipient must act.
    pub requires_action: bool,
}
