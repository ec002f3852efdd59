//! Enrollment lifecycle transitions.
//!
//! Owns every move through `NONE -> PENDING -> {ACTIVE | rejected}` and
//! `ACTIVE <-> INACTIVE`. The approval coordinator calls into this
//! service once a request resolves; transition legality lives in
//! `EnrollmentStatus::can_transition` and in the stores' conditional
//! updates.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use perkhub_core::error::AppError;
use perkhub_core::events::{DomainEvent, EnrollmentEvent, EventPayload};
use perkhub_core::result::AppResult;
use perkhub_core::traits::EventSink;
use perkhub_core::types::{BusinessId, CustomerId, ProgramId};
use perkhub_entity::card::LoyaltyCard;
use perkhub_entity::enrollment::{Enrollment, EnrollmentStatus, NewEnrollment};
use perkhub_entity::notification::{NewNotification, NotificationKind, NotificationPayload};
use perkhub_store::{CatalogStore, LedgerStore};

use crate::card_number::generate_card_number;
use crate::notification::NotificationService;

/// Manages the customer-program enrollment state machine.
#[derive(Clone)]
pub struct EnrollmentService {
    /// Ledger store (enrollments, cards).
    ledger: Arc<dyn LedgerStore>,
    /// Program catalog.
    catalog: Arc<dyn CatalogStore>,
    /// Notification inbox.
    notifications: Arc<NotificationService>,
    /// Live event fan-out.
    events: Arc<dyn EventSink>,
}

impl EnrollmentService {
    /// Creates a new enrollment service.
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        catalog: Arc<dyn CatalogStore>,
        notifications: Arc<NotificationService>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            ledger,
            catalog,
            notifications,
            events,
        }
    }

    /// Fetch an enrollment, if one exists.
    pub async fn enrollment(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<Option<Enrollment>> {
        self.ledger.find_enrollment(customer_id, program_id).await
    }

    /// Fetch a loyalty card, if one exists.
    pub async fn card(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<Option<LoyaltyCard>> {
        self.ledger.find_card(customer_id, program_id).await
    }

    /// Drop a stale PENDING or REJECTED row so a fresh invite can take
    /// its place. Quiet: no notifications, no events.
    pub(crate) async fn discard_stale_invite(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<()> {
        self.ledger
            .remove_unactivated_enrollment(customer_id, program_id)
            .await?;
        Ok(())
    }

    /// Create a PENDING enrollment row for an invite.
    pub(crate) async fn create_pending(
        &self,
        customer_id: CustomerId,
        business_id: BusinessId,
        program_id: ProgramId,
    ) -> AppResult<Enrollment> {
        self.ledger
            .create_enrollment(&NewEnrollment {
                customer_id,
                program_id,
                business_id,
                status: EnrollmentStatus::Pending,
            })
            .await
    }

    /// Create an ACTIVE enrollment and issue its card (direct
    /// no-approval enrollment).
    pub(crate) async fn enroll_direct(
        &self,
        customer_id: CustomerId,
        business_id: BusinessId,
        program_id: ProgramId,
    ) -> AppResult<(Enrollment, LoyaltyCard)> {
        self.ledger
            .create_enrollment(&NewEnrollment {
                customer_id,
                program_id,
                business_id,
                status: EnrollmentStatus::Active,
            })
            .await?;
        let card = self.activate(customer_id, business_id, program_id).await?;
        let enrollment = self
            .ledger
            .find_enrollment(customer_id, program_id)
            .await?
            .ok_or_else(|| AppError::internal("Enrollment vanished after creation"))?;

        info!(
            customer_id = %customer_id,
            program_id = %program_id,
            card_id = %card.id,
            "Customer enrolled directly"
        );
        Ok((enrollment, card))
    }

    /// Activate an enrollment and issue its card idempotently, then
    /// notify both parties.
    ///
    /// Safe to re-run: re-activation returns the existing card without
    /// emitting anything twice (the caller gates duplicate invocation on
    /// the approval request's single resolution).
    pub(crate) async fn activate(
        &self,
        customer_id: CustomerId,
        business_id: BusinessId,
        program_id: ProgramId,
    ) -> AppResult<LoyaltyCard> {
        let card = self
            .ledger
            .activate_with_card(customer_id, program_id, &generate_card_number())
            .await?;

        let program_name = self.program_name(program_id).await;
        let payload = NotificationPayload::Enrollment {
            program_id,
            request_id: None,
            card_id: Some(card.id),
        };
        self.notify_both_parties(
            customer_id,
            business_id,
            NotificationKind::EnrollmentAccepted,
            "Enrollment accepted",
            format!("Enrollment in {program_name} is now active"),
            payload,
            Some(card.id.into_uuid()),
        )
        .await;

        self.emit_both_parties(
            customer_id,
            business_id,
            EnrollmentEvent::Accepted {
                customer_id: customer_id.into_uuid(),
                program_id: program_id.into_uuid(),
                card_id: card.id.into_uuid(),
            },
        )
        .await;

        info!(
            customer_id = %customer_id,
            program_id = %program_id,
            card_id = %card.id,
            "Enrollment activated"
        );
        Ok(card)
    }

    /// Remove a rejected invite's PENDING row and notify both parties.
    pub(crate) async fn reject_invite(
        &self,
        customer_id: CustomerId,
        business_id: BusinessId,
        program_id: ProgramId,
    ) -> AppResult<()> {
        let removed = self
            .ledger
            .remove_unactivated_enrollment(customer_id, program_id)
            .await?;
        if !removed {
            warn!(
                customer_id = %customer_id,
                program_id = %program_id,
                "Rejected invite had no pending enrollment row"
            );
        }

        let program_name = self.program_name(program_id).await;
        self.notify_both_parties(
            customer_id,
            business_id,
            NotificationKind::EnrollmentRejected,
            "Enrollment declined",
            format!("The invitation to {program_name} was declined"),
            NotificationPayload::Enrollment {
                program_id,
                request_id: None,
                card_id: None,
            },
            None,
        )
        .await;

        self.emit_both_parties(
            customer_id,
            business_id,
            EnrollmentEvent::Rejected {
                customer_id: customer_id.into_uuid(),
                program_id: program_id.into_uuid(),
            },
        )
        .await;

        info!(customer_id = %customer_id, program_id = %program_id, "Enrollment invite rejected");
        Ok(())
    }

    /// Deactivate an ACTIVE enrollment.
    pub async fn deactivate(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<()> {
        let enrollment = self
            .ledger
            .find_enrollment(customer_id, program_id)
            .await?
            .ok_or_else(|| AppError::not_found("Enrollment not found"))?;

        let moved = self
            .ledger
            .set_enrollment_status(
                customer_id,
                program_id,
                EnrollmentStatus::Active,
                EnrollmentStatus::Inactive,
            )
            .await?;
        if !moved {
            return Err(AppError::invalid_parameters(format!(
                "Enrollment is {} and cannot be deactivated",
                enrollment.status
            )));
        }

        let program_name = self.program_name(program_id).await;
        self.notifications
            .notify(NewNotification {
                recipient_id: customer_id.into_uuid(),
                business_id: enrollment.business_id,
                kind: NotificationKind::EnrollmentDeactivated,
                title: "Enrollment deactivated".to_string(),
                message: format!("Enrollment in {program_name} was deactivated"),
                payload: NotificationPayload::Enrollment {
                    program_id,
                    request_id: None,
                    card_id: None,
                },
                reference_id: None,
                requires_action: false,
            })
            .await?;

        self.emit(
            customer_id.into_uuid(),
            EnrollmentEvent::Deactivated {
                customer_id: customer_id.into_uuid(),
                program_id: program_id.into_uuid(),
            },
        )
        .await;

        info!(customer_id = %customer_id, program_id = %program_id, "Enrollment deactivated");
        Ok(())
    }

    /// Reactivate an INACTIVE enrollment. The card already exists, so no
    /// issuance happens here.
    pub async fn reactivate(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<Enrollment> {
        let moved = self
            .ledger
            .set_enrollment_status(
                customer_id,
                program_id,
                EnrollmentStatus::Inactive,
                EnrollmentStatus::Active,
            )
            .await?;
        if !moved {
            return Err(AppError::invalid_parameters(
                "Only an inactive enrollment can be reactivated",
            ));
        }
        let enrollment = self
            .ledger
            .find_enrollment(customer_id, program_id)
            .await?
            .ok_or_else(|| AppError::internal("Enrollment vanished after reactivation"))?;

        let program_name = self.program_name(program_id).await;
        self.notifications
            .notify(NewNotification {
                recipient_id: customer_id.into_uuid(),
                business_id: enrollment.business_id,
                kind: NotificationKind::EnrollmentReactivated,
                title: "Enrollment reactivated".to_string(),
                message: format!("Enrollment in {program_name} is active again"),
                payload: NotificationPayload::Enrollment {
                    program_id,
                    request_id: None,
                    card_id: None,
                },
                reference_id: None,
                requires_action: false,
            })
            .await?;

        self.emit(
            customer_id.into_uuid(),
            EnrollmentEvent::Reactivated {
                customer_id: customer_id.into_uuid(),
                program_id: program_id.into_uuid(),
            },
        )
        .await;

        info!(customer_id = %customer_id, program_id = %program_id, "Enrollment reactivated");
        Ok(enrollment)
    }

    /// Delete a program: remove its catalog entry, drop every enrollment
    /// and deactivate the cards, and notify the affected customers.
    /// Ledger history is retained.
    pub async fn remove_program(&self, program_id: ProgramId) -> AppResult<u64> {
        let program = self
            .catalog
            .find_program(program_id)
            .await?
            .ok_or_else(|| AppError::not_found("Program not found"))?;

        self.catalog.delete_program(program_id).await?;
        let removed = self.ledger.remove_program_enrollments(program_id).await?;

        for enrollment in &removed {
            let result = self
                .notifications
                .notify(NewNotification {
                    recipient_id: enrollment.customer_id.into_uuid(),
                    business_id: program.business_id,
                    kind: NotificationKind::ProgramRemoved,
                    title: "Program removed".to_string(),
                    message: format!("The program {} has been removed", program.name),
                    payload: NotificationPayload::Program { program_id },
                    reference_id: None,
                    requires_action: false,
                })
                .await;
            if let Err(e) = result {
                warn!(
                    customer_id = %enrollment.customer_id,
                    error = %e,
                    "Failed to record program-removal notification"
                );
            }

            self.emit(
                enrollment.customer_id.into_uuid(),
                EnrollmentEvent::ProgramRemoved {
                    program_id: program_id.into_uuid(),
                },
            )
            .await;
        }

        info!(
            program_id = %program_id,
            enrollments = removed.len(),
            "Program removed"
        );
        Ok(removed.len() as u64)
    }

    async fn program_name(&self, program_id: ProgramId) -> String {
        match self.catalog.find_program(program_id).await {
            Ok(Some(program)) => program.name,
            _ => "a loyalty program".to_string(),
        }
    }

    async fn emit(&self, recipient_id: Uuid, event: EnrollmentEvent) {
        let event = DomainEvent::new(None, EventPayload::Enrollment(event));
        self.events.emit(recipient_id, &event).await;
    }

    async fn emit_both_parties(
        &self,
        customer_id: CustomerId,
        business_id: BusinessId,
        event: EnrollmentEvent,
    ) {
        let event = DomainEvent::new(None, EventPayload::Enrollment(event));
        self.events.emit(customer_id.into_uuid(), &event).await;
        self.events.emit(business_id.into_uuid(), &event).await;
    }

    #[allow(clippy::too_many_arguments)]
    async fn notify_both_parties(
        &self,
        customer_id: CustomerId,
        business_id: BusinessId,
        kind: NotificationKind,
        title: &str,
        message: String,
        payload: NotificationPayload,
        reference_id: Option<Uuid>,
    ) {
        for recipient_id in [customer_id.into_uuid(), business_id.into_uuid()] {
            let result = self
                .notifications
                .notify(NewNotification {
                    recipient_id,
                    business_id,
                    kind,
                    title: title.to_string(),
                    message: message.clone(),
                    payload: payload.clone(),
                    reference_id,
                    requires_action: false,
                })
                .await;
            if let Err(e) = result {
                warn!(recipient_id = %recipient_id, error = %e, "Failed to record notification");
            }
        }
    }
}
