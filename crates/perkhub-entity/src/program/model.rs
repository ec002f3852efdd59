//! Program and reward catalog models.
//!
//! Only the fields the enrollment/points workflow reads; full program
//! management stays ordinary CRUD outside this workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use perkhub_core::types::{BusinessId, ProgramId, RewardId};

/// A loyalty program run by a business.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Program {
    /// Unique program identifier.
    pub id: ProgramId,
    /// The owning business.
    pub business_id: BusinessId,
    /// Display name.
    pub name: String,
    /// Whether enrollment requires the customer's approval of an invite.
    pub requires_approval: bool,
    /// Whether the program is active.
    pub is_active: bool,
    /// When the program was created.
    pub created_at: DateTime<Utc>,
}

/// A reward redeemable within a program.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reward {
    /// Unique reward identifier.
    pub id: RewardId,
    /// The program offering this reward.
    pub program_id: ProgramId,
    /// Display name.
    pub name: String,
    /// Points deducted on redemption. Zero is valid (benefit-only).
    pub points_required: i64,
    /// Whether the reward can currently be redeemed.
    pub is_active: bool,
    /// When the reward was created.
    pub created_at: DateTime<Utc>,
}
