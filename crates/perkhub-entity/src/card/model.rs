//! Loyalty card entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use perkhub_core::types::{BusinessId, CardId, CustomerId, ProgramId};

use super::tier::Tier;

/// The customer-facing card issued when an enrollment becomes active.
///
/// Exactly one card exists per (customer, program); `points` mirrors the
/// enrollment's current balance and `tier` is recalculated after every
/// point mutation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoyaltyCard {
    /// Unique card identifier.
    pub id: CardId,
    /// The card holder.
    pub customer_id: CustomerId,
    /// The business that owns the program.
    pub business_id: BusinessId,
    /// The program the card belongs to.
    pub program_id: ProgramId,
    /// Unique human-shareable card number.
    pub card_number: String,
    /// Current tier.
    pub tier: Tier,
    /// Points mirror of the enrollment balance.
    pub points: i64,
    /// Points multiplier for the current tier.
    pub points_multiplier: f64,
    /// Whether the card is active.
    pub is_active: bool,
    /// When the card was issued.
    pub created_at: DateTime<Utc>,
    /// When the card was last mutated.
    pub updated_at: DateTime<Utc>,
}
