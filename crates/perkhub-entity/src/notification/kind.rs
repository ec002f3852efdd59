//! Notification kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Event kind a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A business invited the recipient to enroll (requires action).
    EnrollmentRequest,
    /// An enrollment invite was approved.
    EnrollmentAccepted,
    /// An enrollment invite was rejected.
    EnrollmentRejected,
    /// An enrollment was deactivated.
    EnrollmentDeactivated,
    /// An inactive enrollment was reactivated.
    EnrollmentReactivated,
    /// Points were awarded.
    PointsAwarded,
    /// A reward was redeemed.
    RewardRedeemed,
    /// A business asked to deduct points (requires action).
    PointsDeductionRequest,
    /// Points were deducted after an approved deduction request.
    PointsDeducted,
    /// A points deduction request was declined.
    PointsDeductionRejected,
    /// The card crossed a tier threshold.
    TierChanged,
    /// A program the recipient was enrolled in was removed.
    ProgramRemoved,
}

impl NotificationKind {
    /// Return the kind as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnrollmentRequest => "enrollment_request",
            Self::EnrollmentAccepted => "enrollment_accepted",
            Self::EnrollmentRejected => "enrollment_rejected",
            Self::EnrollmentDeactivated => "enrollment_deactivated",
            Self::EnrollmentReactivated => "enrollment_reactivated",
            Self::PointsAwarded => "points_awarded",
            Self::RewardRedeemed => "reward_redeemed",
            Self::PointsDeductionRequest => "points_deduction_request",
            Self::PointsDeducted => "points_deducted",
            Self::PointsDeductionRejected => "points_deduction_rejected",
            Self::TierChanged => "tier_changed",
            Self::ProgramRemoved => "program_removed",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
