//! Enrollment state machine service.

mod service;

pub use service::EnrollmentService;
