//! Enrollment entity: the customer-program relationship.

pub mod model;
pub mod status;

pub use model::{Enrollment, NewEnrollment};
pub use status::EnrollmentStatus;
