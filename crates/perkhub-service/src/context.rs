//! Service wiring.

use std::sync::Arc;

use perkhub_core::config::ApprovalsConfig;
use perkhub_core::traits::EventSink;
use perkhub_store::{ApprovalStore, CatalogStore, LedgerStore, NotificationStore};

use crate::approval::ApprovalService;
use crate::enrollment::EnrollmentService;
use crate::notification::NotificationService;
use crate::points::PointsService;

/// All workflow services, wired once at startup against a set of store
/// adapters and an event sink.
#[derive(Clone)]
pub struct ServiceContext {
    /// Notification inbox.
    pub notifications: Arc<NotificationService>,
    /// Enrollment state machine.
    pub enrollments: Arc<EnrollmentService>,
    /// Points processor.
    pub points: Arc<PointsService>,
    /// Approval coordinator.
    pub approvals: Arc<ApprovalService>,
}

impl ServiceContext {
    /// Wire the full service graph.
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        approvals: Arc<dyn ApprovalStore>,
        notifications: Arc<dyn NotificationStore>,
        catalog: Arc<dyn CatalogStore>,
        events: Arc<dyn EventSink>,
        approvals_config: ApprovalsConfig,
    ) -> Self {
        let notification_service = Arc::new(NotificationService::new(notifications));
        let enrollment_service = Arc::new(EnrollmentService::new(
            Arc::clone(&ledger),
            Arc::clone(&catalog),
            Arc::clone(&notification_service),
            Arc::clone(&events),
        ));
        let points_service = Arc::new(PointsService::new(
            Arc::clone(&ledger),
            Arc::clone(&catalog),
            Arc::clone(&notification_service),
            Arc::clone(&events),
        ));
        let approval_service = Arc::new(ApprovalService::new(
            approvals,
            catalog,
            Arc::clone(&enrollment_service),
            Arc::clone(&points_service),
            Arc::clone(&notification_service),
            events,
            approvals_config,
        ));

        Self {
            notifications: notification_service,
            enrollments: enrollment_service,
            points: points_service,
            approvals: approval_service,
        }
    }
}
