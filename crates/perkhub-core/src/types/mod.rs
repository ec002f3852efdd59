//! Shared value types used across PerkHub crates.

pub mod id;
pub mod pagination;

pub use id::{
    ApprovalRequestId, BusinessId, CardId, CustomerId, NotificationId, ProgramId, RewardId,
    TransactionId,
};
pub use pagination::{PageRequest, PageResponse};
