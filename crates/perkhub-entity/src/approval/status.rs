//! Approval request status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolution state of an approval request.
///
/// `Pending -> {Approved | Rejected}` happens exactly once, via a
/// conditional update. `Expired` is set opportunistically by the sweep;
/// responders check `expires_at` directly and never depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "approval_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// Waiting on the customer.
    Pending,
    /// The customer approved.
    Approved,
    /// The customer rejected.
    Rejected,
    /// The request lapsed unanswered (set by the sweep).
    Expired,
}

impl ApprovalStatus {
    /// Whether the request can still be answered.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
