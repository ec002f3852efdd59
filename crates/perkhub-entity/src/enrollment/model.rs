//! Enrollment entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use perkhub_core::types::{BusinessId, CustomerId, ProgramId};

use super::status::EnrollmentStatus;

/// A customer's relationship to one loyalty program.
///
/// Exactly one row exists per (customer, program); `current_points` is
/// owned by the ledger store and never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    /// The enrolled customer.
    pub customer_id: CustomerId,
    /// The loyalty program.
    pub program_id: ProgramId,
    /// The business that owns the program.
    pub business_id: BusinessId,
    /// Lifecycle status.
    pub status: EnrollmentStatus,
    /// Current redeemable balance. Never negative.
    pub current_points: i64,
    /// Lifetime earned points. Monotonically non-decreasing.
    pub total_points_earned: i64,
    /// When the enrollment was created.
    pub enrolled_at: DateTime<Utc>,
    /// When the enrollment was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Enrollment {
    /// Whether this enrollment can earn or redeem points.
    pub fn can_transact(&self) -> bool {
        self.status.can_transact()
    }
}

/// Parameters for creating a new enrollment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEnrollment {
    /// The customer.
    pub customer_id: CustomerId,
    /// The program.
    pub program_id: ProgramId,
    /// The owning business.
    pub business_id: BusinessId,
    /// Initial status (`Pending` for invites, `Active` for self-enrolls).
    pub status: EnrollmentStatus,
}
