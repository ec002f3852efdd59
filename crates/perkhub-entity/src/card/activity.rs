//! Card activity log: informational entries adjacent to the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use perkhub_core::types::{CardId, CustomerId, ProgramId};

use super::tier::Tier;

/// Kind of card activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "card_activity_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CardActivityKind {
    /// The card crossed a tier threshold.
    TierChange,
}

/// An informational card activity entry. Not a point transaction.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CardActivity {
    /// Unique entry identifier.
    pub id: Uuid,
    /// The card.
    pub card_id: CardId,
    /// The card holder.
    pub customer_id: CustomerId,
    /// The program.
    pub program_id: ProgramId,
    /// What happened.
    pub kind: CardActivityKind,
    /// Tier before the change, for tier changes.
    pub from_tier: Option<Tier>,
    /// Tier after the change, for tier changes.
    pub to_tier: Option<Tier>,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}
