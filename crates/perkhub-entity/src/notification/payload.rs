//! Typed notification payloads.

use serde::{Deserialize, Serialize};

use perkhub_core::types::{ApprovalRequestId, CardId, ProgramId, RewardId};

/// Structured data attached to a notification, tagged by shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// Enrollment lifecycle context.
    Enrollment {
        /// The program.
        program_id: ProgramId,
        /// The approval request gating the invite, if any.
        request_id: Option<ApprovalRequestId>,
        /// The issued card, once one exists.
        card_id: Option<CardId>,
    },
    /// Point transaction context.
    Points {
        /// The program.
        program_id: ProgramId,
        /// Signed point delta.
        points: i64,
        /// Balance after the transaction.
        balance: i64,
        /// The redeemed reward, for redemptions.
        reward_id: Option<RewardId>,
    },
    /// Tier change context.
    Tier {
        /// The program.
        program_id: ProgramId,
        /// Previous tier name.
        from: String,
        /// New tier name.
        to: String,
    },
    /// Program lifecycle context.
    Program {
        /// The program.
        program_id: ProgramId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_roundtrip() {
        let payload = NotificationPayload::Points {
            program_id: ProgramId::new(),
            points: -200,
            balance: 50,
            reward_id: Some(RewardId::new()),
        };
        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json["kind"], "points");
        let back: NotificationPayload = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, payload);
    }
}
