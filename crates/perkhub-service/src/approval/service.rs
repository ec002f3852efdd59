//! Coordinates customer approval requests end to end.
//!
//! Owns the invite path (notification + approval request created
//! together), the pending inbox, and resolution. Resolution is a
//! conditional `PENDING -> resolved` update in the store, so a
//! concurrent double response has exactly one winner; the loser gets
//! `ALREADY_PROCESSED` and nothing is emitted twice.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use perkhub_core::config::ApprovalsConfig;
use perkhub_core::error::AppError;
use perkhub_core::events::{ApprovalEvent, DomainEvent, EnrollmentEvent, EventPayload};
use perkhub_core::result::AppResult;
use perkhub_core::traits::EventSink;
use perkhub_core::types::{ApprovalRequestId, BusinessId, CustomerId, ProgramId};
use perkhub_entity::approval::{
    ApprovalKind, ApprovalPayload, ApprovalRequest, NewApprovalRequest,
};
use perkhub_entity::card::LoyaltyCard;
use perkhub_entity::enrollment::{Enrollment, EnrollmentStatus};
use perkhub_entity::notification::{NewNotification, NotificationKind, NotificationPayload};
use perkhub_store::{ApprovalStore, CatalogStore};

use crate::enrollment::EnrollmentService;
use crate::notification::NotificationService;
use crate::points::PointsService;

/// What `request_enrollment` produced.
#[derive(Debug, Clone)]
pub enum EnrollmentOutcome {
    /// The program required no approval; the enrollment is ACTIVE and a
    /// card was issued.
    Enrolled {
        /// The active enrollment.
        enrollment: Enrollment,
        /// The issued card.
        card: LoyaltyCard,
    },
    /// An approval request now awaits the customer's decision.
    InvitePending {
        /// The pending request.
        request: ApprovalRequest,
    },
}

/// What resolving an approval request produced.
#[derive(Debug, Clone)]
pub enum ApprovalResolution {
    /// An enrollment invite was approved; the card is issued.
    EnrollmentApproved {
        /// The (possibly pre-existing) loyalty card.
        card: LoyaltyCard,
    },
    /// An enrollment invite was declined; the pending row is gone.
    EnrollmentRejected,
    /// A points deduction was approved and applied.
    DeductionApplied {
        /// Balance after the deduction.
        balance: i64,
    },
    /// A points deduction was declined.
    DeductionRejected,
}

/// Coordinates approval requests across the enrollment and points
/// services.
#[derive(Clone)]
pub struct ApprovalService {
    /// Approval request store.
    store: Arc<dyn ApprovalStore>,
    /// Program catalog.
    catalog: Arc<dyn CatalogStore>,
    /// Enrollment state machine.
    enrollments: Arc<EnrollmentService>,
    /// Points processor, for approved deductions.
    points: Arc<PointsService>,
    /// Notification inbox.
    notifications: Arc<NotificationService>,
    /// Live event fan-out.
    events: Arc<dyn EventSink>,
    /// Approval workflow configuration.
    config: ApprovalsConfig,
}

impl ApprovalService {
    /// Creates a new approval service.
    pub fn new(
        store: Arc<dyn ApprovalStore>,
        catalog: Arc<dyn CatalogStore>,
        enrollments: Arc<EnrollmentService>,
        points: Arc<PointsService>,
        notifications: Arc<NotificationService>,
        events: Arc<dyn EventSink>,
        config: ApprovalsConfig,
    ) -> Self {
        Self {
            store,
            catalog,
            enrollments,
            points,
            notifications,
            events,
            config,
        }
    }

    /// Request an enrollment for a customer.
    ///
    /// Direct path when the program needs no approval: the enrollment
    /// becomes ACTIVE and a card is issued immediately. Otherwise a
    /// PENDING enrollment row plus a notification/approval-request pair
    /// is created and the customer decides.
    pub async fn request_enrollment(
        &self,
        customer_id: CustomerId,
        business_id: BusinessId,
        program_id: ProgramId,
    ) -> AppResult<EnrollmentOutcome> {
        let program = self
            .catalog
            .find_program(program_id)
            .await?
            .ok_or_else(|| AppError::not_found("Program not found"))?;
        if !program.is_active {
            return Err(AppError::invalid_parameters("Program is not active"));
        }

        let now = Utc::now();
        if let Some(existing) = self.enrollments.enrollment(customer_id, program_id).await? {
            match existing.status {
                EnrollmentStatus::Active => {
                    return Err(AppError::already_enrolled(
                        "Customer is already enrolled in this program",
                    ));
                }
                EnrollmentStatus::Inactive => {
                    let enrollment =
                        self.enrollments.reactivate(customer_id, program_id).await?;
                    let card = self
                        .enrollments
                        .card(customer_id, program_id)
                        .await?
                        .ok_or_else(|| {
                            AppError::internal("Loyalty card missing for reactivated enrollment")
                        })?;
                    return Ok(EnrollmentOutcome::Enrolled { enrollment, card });
                }
                EnrollmentStatus::Pending => {
                    let live = self
                        .store
                        .has_live_enrollment_request(customer_id, program_id, now)
                        .await?;
                    if live {
                        return Err(AppError::already_pending(
                            "An enrollment invite is already awaiting this customer's decision",
                        ));
                    }
                    // The pending row's request expired or resolved
                    // without cleanup; replace it with a fresh invite.
                    self.enrollments
                        .discard_stale_invite(customer_id, program_id)
                        .await?;
                }
                EnrollmentStatus::Rejected => {
                    self.enrollments
                        .discard_stale_invite(customer_id, program_id)
                        .await?;
                }
            }
        }

        if !program.requires_approval {
            let (enrollment, card) = self
                .enrollments
                .enroll_direct(customer_id, business_id, program_id)
                .await?;
            return Ok(EnrollmentOutcome::Enrolled { enrollment, card });
        }

        self.enrollments
            .create_pending(customer_id, business_id, program_id)
            .await?;

        let request = self
            .create_request(
                customer_id,
                business_id,
                ApprovalKind::Enrollment,
                ApprovalPayload::Enrollment {
                    program_id,
                    program_name: Some(program.name.clone()),
                },
                NotificationKind::EnrollmentRequest,
                "Enrollment invitation".to_string(),
                format!("You have been invited to join {}", program.name),
            )
            .await?;

        self.emit(
            customer_id.into_uuid(),
            EventPayload::Enrollment(EnrollmentEvent::Requested {
                customer_id: customer_id.into_uuid(),
                program_id: program_id.into_uuid(),
                request_id: request.id.into_uuid(),
            }),
        )
        .await;

        info!(
            customer_id = %customer_id,
            program_id = %program_id,
            request_id = %request.id,
            "Enrollment invite created"
        );
        Ok(EnrollmentOutcome::InvitePending { request })
    }

    /// Ask a customer to approve a points deduction.
    pub async fn request_points_deduction(
        &self,
        customer_id: CustomerId,
        business_id: BusinessId,
        program_id: ProgramId,
        points: i64,
        reason: Option<String>,
    ) -> AppResult<ApprovalRequest> {
        if points <= 0 {
            return Err(AppError::invalid_parameters(
                "Deduction points must be positive",
            ));
        }
        let enrollment = self
            .enrollments
            .enrollment(customer_id, program_id)
            .await?
            .ok_or_else(|| AppError::not_enrolled("Customer is not enrolled in this program"))?;
        if !enrollment.can_transact() {
            return Err(AppError::not_enrolled(format!(
                "Enrollment is {} and cannot transact",
                enrollment.status
            )));
        }

        let request = self
            .create_request(
                customer_id,
                business_id,
                ApprovalKind::PointsDeduction,
                ApprovalPayload::PointsDeduction {
                    program_id,
                    points,
                    reason: reason.clone(),
                },
                NotificationKind::PointsDeductionRequest,
                "Points deduction request".to_string(),
                match reason {
                    Some(reason) => format!("A deduction of {points} points was requested: {reason}"),
                    None => format!("A deduction of {points} points was requested"),
                },
            )
            .await?;

        info!(
            customer_id = %customer_id,
            program_id = %program_id,
            request_id = %request.id,
            points,
            "Points deduction request created"
        );
        Ok(request)
    }

    /// The customer's pending, unexpired requests, newest first.
    pub async fn list_pending(&self, customer_id: CustomerId) -> AppResult<Vec<ApprovalRequest>> {
        self.store.list_pending(customer_id, Utc::now()).await
    }

    /// Resolve an approval request on behalf of its owning customer.
    ///
    /// Fails `EXPIRED` past the deadline and `ALREADY_PROCESSED` when
    /// the request has already been answered, including by a concurrent
    /// call racing this one. Once the resolution is recorded it stands:
    /// a failure in the follow-up effects (card issuance, deduction) is
    /// surfaced to the caller but does not revert the stored decision.
    pub async fn respond(
        &self,
        request_id: ApprovalRequestId,
        customer_id: CustomerId,
        approved: bool,
    ) -> AppResult<ApprovalResolution> {
        let now = Utc::now();
        let request = self
            .store
            .find(request_id)
            .await?
            .filter(|r| r.customer_id == customer_id)
            .ok_or_else(|| AppError::not_found("Approval request not found"))?;

        if request.is_expired_at(now) {
            return Err(AppError::expired("Approval request has expired"));
        }
        if !request.status.is_pending() {
            return Err(AppError::already_processed(
                "Approval request has already been resolved",
            ));
        }

        let resolved = self
            .store
            .resolve(request_id, approved, now)
            .await?
            .ok_or_else(|| {
                AppError::already_processed("Approval request has already been resolved")
            })?;

        if let Err(e) = self
            .notifications
            .mark_action_taken(resolved.notification_id)
            .await
        {
            warn!(
                request_id = %request_id,
                error = %e,
                "Failed to mark approval notification actioned"
            );
        }

        self.emit(
            resolved.business_id.into_uuid(),
            EventPayload::Approval(ApprovalEvent::Resolved {
                request_id: request_id.into_uuid(),
                approved,
            }),
        )
        .await;

        info!(
            request_id = %request_id,
            customer_id = %customer_id,
            approved,
            kind = resolved.kind.as_str(),
            "Approval request resolved"
        );

        match (&resolved.payload.0, approved) {
            (ApprovalPayload::Enrollment { program_id, .. }, true) => {
                let card = self
                    .enrollments
                    .activate(customer_id, resolved.business_id, *program_id)
                    .await
                    .map_err(|e| {
                        // Resolution stands; the enrollment is repaired
                        // out of band and the card issued on retry paths.
                        error!(
                            request_id = %request_id,
                            error = %e,
                            "Approved enrollment failed to activate"
                        );
                        e
                    })?;
                Ok(ApprovalResolution::EnrollmentApproved { card })
            }
            (ApprovalPayload::Enrollment { program_id, .. }, false) => {
                self.enrollments
                    .reject_invite(customer_id, resolved.business_id, *program_id)
                    .await?;
                Ok(ApprovalResolution::EnrollmentRejected)
            }
            (ApprovalPayload::PointsDeduction { program_id, points, reason }, true) => {
                let update = self
                    .points
                    .apply_deduction(
                        customer_id,
                        resolved.business_id,
                        *program_id,
                        *points,
                        reason.clone(),
                    )
                    .await?;
                // The customer's row is recorded by the deduction itself;
                // the business gets its own outcome row here.
                self.notify_deduction_outcome(
                    resolved.business_id.into_uuid(),
                    resolved.business_id,
                    *program_id,
                    *points,
                    update.balance,
                    NotificationKind::PointsDeducted,
                    "Points deducted",
                    format!("The requested deduction of {points} points was applied"),
                )
                .await;
                Ok(ApprovalResolution::DeductionApplied {
                    balance: update.balance,
                })
            }
            (ApprovalPayload::PointsDeduction { program_id, points, .. }, false) => {
                let balance = match self.enrollments.enrollment(customer_id, *program_id).await {
                    Ok(Some(enrollment)) => enrollment.current_points,
                    _ => 0,
                };
                for recipient_id in [customer_id.into_uuid(), resolved.business_id.into_uuid()] {
                    self.notify_deduction_outcome(
                        recipient_id,
                        resolved.business_id,
                        *program_id,
                        *points,
                        balance,
                        NotificationKind::PointsDeductionRejected,
                        "Points deduction declined",
                        format!("The request to deduct {points} points was declined"),
                    )
                    .await;
                }
                Ok(ApprovalResolution::DeductionRejected)
            }
        }
    }

    /// Flip overdue PENDING requests to EXPIRED. Called by the sweep;
    /// `respond` and `list_pending` check `expires_at` directly, so this
    /// is bookkeeping, not a correctness gate.
    pub async fn expire_overdue(&self) -> AppResult<u64> {
        self.store.expire_overdue(Utc::now()).await
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_request(
        &self,
        customer_id: CustomerId,
        business_id: BusinessId,
        kind: ApprovalKind,
        payload: ApprovalPayload,
        notification_kind: NotificationKind,
        title: String,
        message: String,
    ) -> AppResult<ApprovalRequest> {
        let request_id = ApprovalRequestId::new();
        let expires_at = Utc::now() + Duration::days(i64::from(self.config.expiry_days));

        let notification = NewNotification {
            recipient_id: customer_id.into_uuid(),
            business_id,
            kind: notification_kind,
            title,
            message,
            payload: NotificationPayload::Enrollment {
                program_id: payload.program_id(),
                request_id: Some(request_id),
                card_id: None,
            },
            reference_id: Some(request_id.into_uuid()),
            requires_action: true,
        };
        let request = NewApprovalRequest {
            id: request_id,
            customer_id,
            business_id,
            kind,
            payload,
            expires_at,
        };

        let (_, stored) = self
            .store
            .create_with_notification(&notification, &request)
            .await?;

        self.emit(
            customer_id.into_uuid(),
            EventPayload::Approval(ApprovalEvent::Created {
                request_id: stored.id.into_uuid(),
                kind: kind.as_str().to_string(),
            }),
        )
        .await;

        Ok(stored)
    }

    /// Record a deduction outcome row. Best-effort: the resolution
    /// already stands.
    #[allow(clippy::too_many_arguments)]
    async fn notify_deduction_outcome(
        &self,
        recipient_id: Uuid,
        business_id: BusinessId,
        program_id: ProgramId,
        points: i64,
        balance: i64,
        kind: NotificationKind,
        title: &str,
        message: String,
    ) {
        let result = self
            .notifications
            .notify(NewNotification {
                recipient_id,
                business_id,
                kind,
                title: title.to_string(),
                message,
                payload: NotificationPayload::Points {
                    program_id,
                    points,
                    balance,
                    reward_id: None,
                },
                reference_id: None,
                requires_action: false,
            })
            .await;
        if let Err(e) = result {
            warn!(
                recipient_id = %recipient_id,
                error = %e,
                "Failed to record deduction outcome notification"
            );
        }
    }

    async fn emit(&self, recipient_id: Uuid, payload: EventPayload) {
        let event = DomainEvent::new(None, payload);
        self.events.emit(recipient_id, &event).await;
    }
}
