//! Points ledger events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events related to point transactions and card tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PointsEvent {
    /// Points were awarded to an enrollment.
    Awarded {
        /// The customer.
        customer_id: Uuid,
        /// The program.
        program_id: Uuid,
        /// Points awarded.
        points: i64,
        /// Balance after the award.
        balance: i64,
    },
    /// Points were redeemed against a reward.
    Redeemed {
        /// The customer.
        customer_id: Uuid,
        /// The program.
        program_id: Uuid,
        /// The redeemed reward.
        reward_id: Uuid,
        /// Points deducted (may be zero for benefit-only rewards).
        points: i64,
        /// Balance after the redemption.
        balance: i64,
    },
    /// Points were deducted via an approved deduction request.
    Deducted {
        /// The customer.
        customer_id: Uuid,
        /// The program.
        program_id: Uuid,
        /// Points deducted.
        points: i64,
        /// Balance after the deduction.
        balance: i64,
    },
    /// A card crossed a tier threshold.
    TierChanged {
        /// The customer.
        customer_id: Uuid,
        /// The program.
        program_id: Uuid,
        /// Previous tier name.
        from: String,
        /// New tier name.
        to: String,
    },
}
