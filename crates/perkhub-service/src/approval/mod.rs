//! Approval workflow coordinator.

mod service;

pub use service::{ApprovalResolution, ApprovalService, EnrollmentOutcome};
