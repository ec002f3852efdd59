//! # perkhub-service
//!
//! The enrollment & points-ledger workflow, written once against the
//! store traits in `perkhub-store`:
//!
//! - [`enrollment::EnrollmentService`] — the enrollment state machine,
//! - [`approval::ApprovalService`] — the approval workflow coordinator,
//! - [`points::PointsService`] — the points transaction processor,
//! - [`notification::NotificationService`] — the notification inbox.
//!
//! Services emit live events through [`perkhub_core::traits::EventSink`];
//! delivery is best-effort and never fails the owning operation.

pub mod approval;
pub mod card_number;
pub mod context;
pub mod enrollment;
pub mod notification;
pub mod points;

pub use approval::{ApprovalResolution, ApprovalService, EnrollmentOutcome};
pub use context::ServiceContext;
pub use enrollment::EnrollmentService;
pub use notification::NotificationService;
pub use points::PointsService;
