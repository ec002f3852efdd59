//! Approval expiry sweep.

use std::sync::Arc;

use async_trait::async_trait;

use perkhub_core::result::AppResult;
use perkhub_service::ApprovalService;

use super::Sweep;

/// Flips overdue PENDING approval requests to EXPIRED.
///
/// Bookkeeping only: `respond` and the pending inbox both check
/// `expires_at` directly, so a missed pass never lets an expired
/// request through.
pub struct ApprovalExpirySweep {
    /// Approval coordinator.
    approvals: Arc<ApprovalService>,
}

impl ApprovalExpirySweep {
    /// Create a new approval expiry sweep.
    pub fn new(approvals: Arc<ApprovalService>) -> Self {
        Self { approvals }
    }
}

#[async_trait]
impl Sweep for ApprovalExpirySweep {
    fn name(&self) -> &'static str {
        "approval_expiry"
    }

    async fn run(&self) -> AppResult<u64> {
        let expired = self.approvals.expire_overdue().await?;
        if expired > 0 {
            tracing::info!("Marked {} overdue approval requests expired", expired);
        }
        Ok(expired)
    }
}
