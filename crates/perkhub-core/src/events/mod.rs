//! Domain events emitted by PerkHub operations.
//!
//! Events are handed to the fan-out sink after the owning store
//! transaction commits; live delivery is best-effort, the persisted
//! notification row is the at-least-once channel.

pub mod approval;
pub mod enrollment;
pub mod points;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use approval::ApprovalEvent;
pub use enrollment::EnrollmentEvent;
pub use points::PointsEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The user who caused the event (if applicable).
    pub actor_id: Option<Uuid>,
    /// The event payload.
    pub payload: EventPayload,
}

/// Union of all domain event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event")]
pub enum EventPayload {
    /// An enrollment lifecycle event.
    Enrollment(EnrollmentEvent),
    /// An approval workflow event.
    Approval(ApprovalEvent),
    /// A points ledger event.
    Points(PointsEvent),
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(actor_id: Option<Uuid>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor_id,
            payload,
        }
    }
}
