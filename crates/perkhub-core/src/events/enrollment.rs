//! Enrollment lifecycle events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events related to the customer-program relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EnrollmentEvent {
    /// A business invited a customer to a program (approval pending).
    Requested {
        /// The customer being invited.
        customer_id: Uuid,
        /// The program.
        program_id: Uuid,
        /// The approval request gating the invite.
        request_id: Uuid,
    },
    /// An enrollment became active and a card was issued.
    Accepted {
        /// The customer.
        customer_id: Uuid,
        /// The program.
        program_id: Uuid,
        /// The issued loyalty card.
        card_id: Uuid,
    },
    /// A pending enrollment invite was rejected.
    Rejected {
        /// The customer.
        customer_id: Uuid,
        /// The program.
        program_id: Uuid,
    },
    /// An active enrollment was deactivated.
    Deactivated {
        /// The customer.
        customer_id: Uuid,
        /// The program.
        program_id: Uuid,
    },
    /// An inactive enrollment was reactivated.
    Reactivated {
        /// The customer.
        customer_id: Uuid,
        /// The program.
        program_id: Uuid,
    },
    /// A program was deleted and its enrollments removed.
    ProgramRemoved {
        /// The deleted program.
        program_id: Uuid,
    },
}
