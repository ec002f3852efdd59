//! # perkhub-worker
//!
//! Periodic maintenance sweeps. None of them gate correctness: the
//! workflow checks deadlines directly, and the sweeps only keep stored
//! state tidy (expired approval rows flipped, old notifications
//! deleted, oversized inboxes trimmed).

pub mod runner;
pub mod sweeps;

pub use runner::SweepRunner;
pub use sweeps::{ApprovalExpirySweep, NotificationCleanupSweep, Sweep};
