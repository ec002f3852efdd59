//! Built-in sweep implementations.

pub mod approval;
pub mod notification;

pub use approval::ApprovalExpirySweep;
pub use notification::NotificationCleanupSweep;

use async_trait::async_trait;

use perkhub_core::result::AppResult;

/// One unit of periodic maintenance work.
#[async_trait]
pub trait Sweep: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Run one pass. Returns how many rows were touched.
    async fn run(&self) -> AppResult<u64>;
}
