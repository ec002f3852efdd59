//! Point transaction (ledger entry) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use perkhub_core::types::{BusinessId, CustomerId, ProgramId, RewardId, TransactionId};

use super::kind::TransactionKind;

/// An immutable, append-only ledger entry.
///
/// `points` is signed by kind (positive for awards, negative for
/// redemptions); the signed sum over an enrollment's history reconciles
/// with its current balance at all times.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PointTransaction {
    /// Unique ledger entry identifier.
    pub id: TransactionId,
    /// The customer.
    pub customer_id: CustomerId,
    /// The business.
    pub business_id: BusinessId,
    /// The program.
    pub program_id: ProgramId,
    /// Signed point delta.
    pub points: i64,
    /// Transaction direction.
    pub kind: TransactionKind,
    /// The redeemed reward, for redemptions.
    pub reward_id: Option<RewardId>,
    /// When the entry was appended.
    pub created_at: DateTime<Utc>,
}

/// Parameters for appending a ledger entry.
///
/// `points` is an unsigned magnitude; the store signs it by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPointTransaction {
    /// The customer.
    pub customer_id: CustomerId,
    /// The business.
    pub business_id: BusinessId,
    /// The program.
    pub program_id: ProgramId,
    /// Point magnitude (non-negative).
    pub points: i64,
    /// Transaction direction.
    pub kind: TransactionKind,
    /// The redeemed reward, for redemptions.
    pub reward_id: Option<RewardId>,
}

impl NewPointTransaction {
    /// The signed delta this entry applies to the balance.
    pub fn signed_points(&self) -> i64 {
        self.points * self.kind.sign()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_points() {
        let base = NewPointTransaction {
            customer_id: CustomerId::new(),
            business_id: BusinessId::new(),
            program_id: ProgramId::new(),
            points: 150,
            kind: TransactionKind::Award,
            reward_id: None,
        };
        assert_eq!(base.signed_points(), 150);

        let redeem = NewPointTransaction {
            kind: TransactionKind::Redeem,
            ..base
        };
        assert_eq!(redeem.signed_points(), -150);
    }
}
