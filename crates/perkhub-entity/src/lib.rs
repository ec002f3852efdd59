//! # perkhub-entity
//!
//! Domain entity models for PerkHub: enrollments, approval requests,
//! loyalty cards, the points ledger, notifications, and the slim program
//! catalog. Pure domain logic (status transition legality, tier
//! thresholds) lives here; persistence lives in `perkhub-store`.

pub mod approval;
pub mod card;
pub mod enrollment;
pub mod ledger;
pub mod notification;
pub mod program;

pub use approval::{ApprovalKind, ApprovalPayload, ApprovalRequest, ApprovalStatus, NewApprovalRequest};
pub use card::{CardActivity, CardActivityKind, LoyaltyCard, Tier};
pub use enrollment::{Enrollment, EnrollmentStatus, NewEnrollment};
pub use ledger::{NewPointTransaction, PointTransaction, TransactionKind};
pub use notification::{NewNotification, Notification, NotificationKind, NotificationPayload};
pub use program::{Program, Reward};
