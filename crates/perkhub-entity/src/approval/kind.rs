//! Approval request kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the customer is being asked to approve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "approval_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalKind {
    /// A business invited the customer to enroll in a program.
    Enrollment,
    /// A business wants to deduct points from the customer's balance.
    PointsDeduction,
}

impl ApprovalKind {
    /// Return the kind as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enrollment => "enrollment",
            Self::PointsDeduction => "points_deduction",
        }
    }
}

impl fmt::Display for ApprovalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
