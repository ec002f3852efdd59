//! Typed approval request payloads.
//!
//! The source of these requests is a loose key-value blob; modeling it as
//! a tagged variant keeps the flexibility without losing type safety.

use serde::{Deserialize, Serialize};

use perkhub_core::types::ProgramId;

/// Structured payload attached to an approval request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApprovalPayload {
    /// Payload for an enrollment invite.
    Enrollment {
        /// The program the customer is invited to.
        program_id: ProgramId,
        /// Display name of the program, if known at creation time.
        program_name: Option<String>,
    },
    /// Payload for a points deduction request.
    PointsDeduction {
        /// The program whose balance is affected.
        program_id: ProgramId,
        /// Points to deduct on approval.
        points: i64,
        /// Optional reason shown to the customer.
        reason: Option<String>,
    },
}

impl ApprovalPayload {
    /// The program this request concerns.
    pub fn program_id(&self) -> ProgramId {
        match self {
            Self::Enrollment { program_id, .. } => *program_id,
            Self::PointsDeduction { program_id, .. } => *program_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_tagged() {
        let payload = ApprovalPayload::PointsDeduction {
            program_id: ProgramId::new(),
            points: 250,
            reason: Some("returned purchase".to_string()),
        };
        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json["kind"], "points_deduction");
        assert_eq!(json["points"], 250);

        let back: ApprovalPayload = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, payload);
    }
}
