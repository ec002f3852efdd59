//! Enrollment status enumeration and transition legality.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a customer's enrollment in a loyalty program.
///
/// Lifecycle: `Pending -> {Active | Rejected}`, `Active <-> Inactive`.
/// `Rejected` is terminal; a rejected invite is removed and a new invite
/// starts over from `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "enrollment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    /// Invite sent, waiting on the customer's approval.
    Pending,
    /// Enrollment is active; the customer can earn and redeem.
    Active,
    /// The customer declined the invite.
    Rejected,
    /// Enrollment was deactivated; re-enterable.
    Inactive,
}

impl EnrollmentStatus {
    /// Whether point transactions are allowed in this status.
    pub fn can_transact(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Whether a transition to `to` is legal.
    pub fn can_transition(&self, to: EnrollmentStatus) -> bool {
        use EnrollmentStatus::*;
        matches!(
            (self, to),
            (Pending, Active) | (Pending, Rejected) | (Active, Inactive) | (Inactive, Active)
        )
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Rejected => "rejected",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = perkhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "rejected" => Ok(Self::Rejected),
            "inactive" => Ok(Self::Inactive),
            _ => Err(perkhub_core::AppError::invalid_parameters(format!(
                "Invalid enrollment status: '{s}'. Expected one of: pending, active, rejected, inactive"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_active_can_transact() {
        assert!(EnrollmentStatus::Active.can_transact());
        assert!(!EnrollmentStatus::Pending.can_transact());
        assert!(!EnrollmentStatus::Inactive.can_transact());
        assert!(!EnrollmentStatus::Rejected.can_transact());
    }

    #[test]
    fn test_transition_table() {
        use EnrollmentStatus::*;
        assert!(Pending.can_transition(Active));
        assert!(Pending.can_transition(Rejected));
        assert!(Active.can_transition(Inactive));
        assert!(Inactive.can_transition(Active));

        assert!(!Rejected.can_transition(Active));
        assert!(!Active.can_transition(Pending));
        assert!(!Inactive.can_transition(Pending));
        assert!(!Pending.can_transition(Inactive));
    }

    #[test]
    fn test_from_str_roundtrip() {
        for s in ["pending", "active", "rejected", "inactive"] {
            let status: EnrollmentStatus = s.parse().expect("should parse");
            assert_eq!(status.as_str(), s);
        }
        assert!("bogus".parse::<EnrollmentStatus>().is_err());
    }
}
