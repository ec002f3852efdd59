//! Approval request entity: a pending customer decision.

pub mod kind;
pub mod model;
pub mod payload;
pub mod status;

pub use kind::ApprovalKind;
pub use model::{ApprovalRequest, NewApprovalRequest};
pub use payload::ApprovalPayload;
pub use status::ApprovalStatus;
