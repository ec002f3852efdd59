//! Approval workflow events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events related to customer approval requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ApprovalEvent {
    /// A new approval request was created for a customer.
    Created {
        /// The approval request.
        request_id: Uuid,
        /// The request kind (`enrollment`, `points_deduction`).
        kind: String,
    },
    /// An approval request was resolved.
    Resolved {
        /// The approval request.
        request_id: Uuid,
        /// Whether the customer approved.
        approved: bool,
    },
}
