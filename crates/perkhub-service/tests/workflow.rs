//! End-to-end workflow tests over the in-memory store double.
//!
//! Every test drives the real services; only the storage adapter is
//! swapped, and the memory adapter enforces the same atomicity
//! contracts as the postgres one.

use std::sync::Arc;

use perkhub_core::config::ApprovalsConfig;
use perkhub_core::error::ErrorKind;
use perkhub_core::traits::NullEventSink;
use perkhub_core::types::{
    BusinessId, CustomerId, PageRequest, ProgramId, RewardId,
};
use perkhub_entity::approval::ApprovalStatus;
use perkhub_entity::card::Tier;
use perkhub_entity::enrollment::EnrollmentStatus;
use perkhub_entity::notification::NotificationKind;
use perkhub_entity::program::{Program, Reward};
use perkhub_service::{ApprovalResolution, EnrollmentOutcome, ServiceContext};
use perkhub_store::store::memory::MemoryStore;
use perkhub_store::{ApprovalStore, CatalogStore, LedgerStore, NotificationStore};

struct Harness {
    store: Arc<MemoryStore>,
    services: ServiceContext,
    business_id: BusinessId,
}

fn harness_with_config(config: ApprovalsConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let services = ServiceContext::new(
        Arc::clone(&store) as Arc<dyn LedgerStore>,
        Arc::clone(&store) as Arc<dyn ApprovalStore>,
        Arc::clone(&store) as Arc<dyn NotificationStore>,
        Arc::clone(&store) as Arc<dyn CatalogStore>,
        Arc::new(NullEventSink),
        config,
    );
    Harness {
        store,
        services,
        business_id: BusinessId::new(),
    }
}

fn harness() -> Harness {
    harness_with_config(ApprovalsConfig::default())
}

impl Harness {
    async fn seed_program(&self, requires_approval: bool) -> ProgramId {
        let program = Program {
            id: ProgramId::new(),
            business_id: self.business_id,
            name: "Coffee Club".to_string(),
            requires_approval,
            is_active: true,
            created_at: chrono::Utc::now(),
        };
        self.store
            .create_program(&program)
            .await
            .expect("seed program");
        program.id
    }

    async fn seed_reward(&self, program_id: ProgramId, points_required: i64) -> RewardId {
        let reward = Reward {
            id: RewardId::new(),
            program_id,
            name: "Free Espresso".to_string(),
            points_required,
            is_active: true,
            created_at: chrono::Utc::now(),
        };
        self.store.create_reward(&reward).await.expect("seed reward");
        reward.id
    }

    /// Enroll a customer into a no-approval program.
    async fn enroll_active(&self, program_id: ProgramId) -> CustomerId {
        let customer_id = CustomerId::new();
        let outcome = self
            .services
            .approvals
            .request_enrollment(customer_id, self.business_id, program_id)
            .await
            .expect("direct enrollment");
        assert!(matches!(outcome, EnrollmentOutcome::Enrolled { .. }));
        customer_id
    }

    async fn notification_count(&self, recipient_id: uuid::Uuid, kind: NotificationKind) -> usize {
        let page = self
            .services
            .notifications
            .list(recipient_id, PageRequest::new(1, 100))
            .await
            .expect("list notifications");
        page.items.iter().filter(|n| n.kind == kind).count()
    }
}

#[tokio::test]
async fn ledger_reconciles_with_balance() {
    let h = harness();
    let program_id = h.seed_program(false).await;
    let customer_id = h.enroll_active(program_id).await;
    let reward_id = h.seed_reward(program_id, 200).await;

    h.services
        .points
        .award_points(customer_id, h.business_id, program_id, 500)
        .await
        .expect("first award");
    h.services
        .points
        .award_points(customer_id, h.business_id, program_id, 700)
        .await
        .expect("second award");
    h.services
        .points
        .redeem_reward(customer_id, h.business_id, program_id, reward_id)
        .await
        .expect("redemption");

    let enrollment = h
        .services
        .enrollments
        .enrollment(customer_id, program_id)
        .await
        .expect("fetch enrollment")
        .expect("enrollment exists");
    assert_eq!(enrollment.current_points, 1000);
    assert_eq!(enrollment.total_points_earned, 1200);

    let history = h
        .services
        .points
        .history(customer_id, program_id, PageRequest::new(1, 100))
        .await
        .expect("history");
    let signed_sum: i64 = history.items.iter().map(|t| t.points).sum();
    assert_eq!(signed_sum, enrollment.current_points);

    let card = h
        .services
        .enrollments
        .card(customer_id, program_id)
        .await
        .expect("fetch card")
        .expect("card exists");
    assert_eq!(card.points, enrollment.current_points);
}

#[tokio::test]
async fn concurrent_double_approve_issues_one_card() {
    let h = harness();
    let program_id = h.seed_program(true).await;
    let customer_id = CustomerId::new();

    let outcome = h
        .services
        .approvals
        .request_enrollment(customer_id, h.business_id, program_id)
        .await
        .expect("invite");
    let request = match outcome {
        EnrollmentOutcome::InvitePending { request } => request,
        other => panic!("expected pending invite, got {other:?}"),
    };

    let (first, second) = tokio::join!(
        h.services.approvals.respond(request.id, customer_id, true),
        h.services.approvals.respond(request.id, customer_id, true),
    );

    let results = [first, second];
    let winners: Vec<_> = results.iter().filter(|r| r.is_ok()).collect();
    let losers: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(winners.len(), 1, "exactly one response wins");
    assert_eq!(losers.len(), 1);
    assert_eq!(losers[0].kind, ErrorKind::AlreadyProcessed);

    let card = h
        .services
        .enrollments
        .card(customer_id, program_id)
        .await
        .expect("fetch card")
        .expect("card issued");
    assert_eq!(card.tier, Tier::Standard);

    // The loser must not have re-emitted the acceptance.
    assert_eq!(
        h.notification_count(customer_id.into_uuid(), NotificationKind::EnrollmentAccepted)
            .await,
        1
    );
}

#[tokio::test]
async fn award_without_enrollment_fails_with_no_side_effects() {
    let h = harness();
    let program_id = h.seed_program(false).await;
    let customer_id = CustomerId::new();

    let err = h
        .services
        .points
        .award_points(customer_id, h.business_id, program_id, 100)
        .await
        .expect_err("award must fail");
    assert_eq!(err.kind, ErrorKind::NotEnrolled);

    let history = h
        .services
        .points
        .history(customer_id, program_id, PageRequest::new(1, 10))
        .await
        .expect("history");
    assert!(history.items.is_empty());
    assert_eq!(
        h.notification_count(customer_id.into_uuid(), NotificationKind::PointsAwarded)
            .await,
        0
    );
}

#[tokio::test]
async fn award_on_inactive_enrollment_fails() {
    let h = harness();
    let program_id = h.seed_program(false).await;
    let customer_id = h.enroll_active(program_id).await;

    h.services
        .enrollments
        .deactivate(customer_id, program_id)
        .await
        .expect("deactivate");

    let err = h
        .services
        .points
        .award_points(customer_id, h.business_id, program_id, 100)
        .await
        .expect_err("award must fail");
    assert_eq!(err.kind, ErrorKind::NotEnrolled);
}

#[tokio::test]
async fn crossing_threshold_changes_tier_atomically() {
    let h = harness();
    let program_id = h.seed_program(false).await;
    let customer_id = h.enroll_active(program_id).await;

    let update = h
        .services
        .points
        .award_points(customer_id, h.business_id, program_id, 999)
        .await
        .expect("first award");
    assert_eq!(update.card.tier, Tier::Standard);

    let update = h
        .services
        .points
        .award_points(customer_id, h.business_id, program_id, 2)
        .await
        .expect("threshold award");
    assert_eq!(update.balance, 1001);
    assert_eq!(update.previous_tier, Tier::Standard);
    assert_eq!(update.card.tier, Tier::Silver);
    assert_eq!(update.card.points_multiplier, Tier::Silver.multiplier());

    assert_eq!(
        h.notification_count(customer_id.into_uuid(), NotificationKind::TierChanged)
            .await,
        1
    );
}

#[tokio::test]
async fn expired_request_cannot_be_resolved() {
    let h = harness_with_config(ApprovalsConfig { expiry_days: 0 });
    let program_id = h.seed_program(true).await;
    let customer_id = CustomerId::new();

    let outcome = h
        .services
        .approvals
        .request_enrollment(customer_id, h.business_id, program_id)
        .await
        .expect("invite");
    let request = match outcome {
        EnrollmentOutcome::InvitePending { request } => request,
        other => panic!("expected pending invite, got {other:?}"),
    };

    let err = h
        .services
        .approvals
        .respond(request.id, customer_id, true)
        .await
        .expect_err("respond must fail");
    assert_eq!(err.kind, ErrorKind::Expired);

    let enrollment = h
        .services
        .enrollments
        .enrollment(customer_id, program_id)
        .await
        .expect("fetch enrollment")
        .expect("row still present");
    assert_eq!(enrollment.status, EnrollmentStatus::Pending);
    assert!(h
        .services
        .enrollments
        .card(customer_id, program_id)
        .await
        .expect("fetch card")
        .is_none());

    // Expired requests are invisible to the pending inbox.
    let pending = h
        .services
        .approvals
        .list_pending(customer_id)
        .await
        .expect("list pending");
    assert!(pending.is_empty());
}

#[tokio::test]
async fn invite_then_approve_activates_with_standard_card() {
    let h = harness();
    let program_id = h.seed_program(true).await;
    let customer_id = CustomerId::new();

    let outcome = h
        .services
        .approvals
        .request_enrollment(customer_id, h.business_id, program_id)
        .await
        .expect("invite");
    let request = match outcome {
        EnrollmentOutcome::InvitePending { request } => request,
        other => panic!("expected pending invite, got {other:?}"),
    };

    let enrollment = h
        .services
        .enrollments
        .enrollment(customer_id, program_id)
        .await
        .expect("fetch enrollment")
        .expect("pending row created");
    assert_eq!(enrollment.status, EnrollmentStatus::Pending);

    let resolution = h
        .services
        .approvals
        .respond(request.id, customer_id, true)
        .await
        .expect("approve");
    let card = match resolution {
        ApprovalResolution::EnrollmentApproved { card } => card,
        other => panic!("expected approved enrollment, got {other:?}"),
    };

    let enrollment = h
        .services
        .enrollments
        .enrollment(customer_id, program_id)
        .await
        .expect("fetch enrollment")
        .expect("row exists");
    assert_eq!(enrollment.status, EnrollmentStatus::Active);
    assert_eq!(enrollment.current_points, 0);
    assert_eq!(card.tier, Tier::Standard);
    assert_eq!(card.points, 0);
}

#[tokio::test]
async fn insufficient_balance_rejects_redemption_untouched() {
    let h = harness();
    let program_id = h.seed_program(false).await;
    let customer_id = h.enroll_active(program_id).await;
    let reward_id = h.seed_reward(program_id, 200).await;

    h.services
        .points
        .award_points(customer_id, h.business_id, program_id, 150)
        .await
        .expect("award");

    let err = h
        .services
        .points
        .redeem_reward(customer_id, h.business_id, program_id, reward_id)
        .await
        .expect_err("redemption must fail");
    assert_eq!(err.kind, ErrorKind::InsufficientPoints);

    let enrollment = h
        .services
        .enrollments
        .enrollment(customer_id, program_id)
        .await
        .expect("fetch enrollment")
        .expect("row exists");
    assert_eq!(enrollment.current_points, 150);

    let history = h
        .services
        .points
        .history(customer_id, program_id, PageRequest::new(1, 10))
        .await
        .expect("history");
    assert_eq!(history.items.len(), 1, "no ledger entry for the failure");
}

#[tokio::test]
async fn zero_point_reward_redeems_cleanly() {
    let h = harness();
    let program_id = h.seed_program(false).await;
    let customer_id = h.enroll_active(program_id).await;
    let reward_id = h.seed_reward(program_id, 0).await;

    let update = h
        .services
        .points
        .redeem_reward(customer_id, h.business_id, program_id, reward_id)
        .await
        .expect("benefit-only redemption");
    assert_eq!(update.balance, 0);
    assert_eq!(update.transaction.points, 0);
}

#[tokio::test]
async fn rejecting_invite_returns_relationship_to_none() {
    let h = harness();
    let program_id = h.seed_program(true).await;
    let customer_id = CustomerId::new();

    let outcome = h
        .services
        .approvals
        .request_enrollment(customer_id, h.business_id, program_id)
        .await
        .expect("invite");
    let request = match outcome {
        EnrollmentOutcome::InvitePending { request } => request,
        other => panic!("expected pending invite, got {other:?}"),
    };

    let resolution = h
        .services
        .approvals
        .respond(request.id, customer_id, false)
        .await
        .expect("reject");
    assert!(matches!(resolution, ApprovalResolution::EnrollmentRejected));

    assert!(h
        .services
        .enrollments
        .enrollment(customer_id, program_id)
        .await
        .expect("fetch enrollment")
        .is_none());

    let stored = h
        .store
        .find(request.id)
        .await
        .expect("fetch request")
        .expect("request kept for audit");
    assert_eq!(stored.status, ApprovalStatus::Rejected);

    assert_eq!(
        h.notification_count(customer_id.into_uuid(), NotificationKind::EnrollmentRejected)
            .await,
        1
    );
    assert_eq!(
        h.notification_count(h.business_id.into_uuid(), NotificationKind::EnrollmentRejected)
            .await,
        1
    );

    // A fresh invite is possible afterwards.
    let outcome = h
        .services
        .approvals
        .request_enrollment(customer_id, h.business_id, program_id)
        .await
        .expect("re-invite after rejection");
    assert!(matches!(outcome, EnrollmentOutcome::InvitePending { .. }));
}

#[tokio::test]
async fn duplicate_invite_conflicts() {
    let h = harness();
    let program_id = h.seed_program(true).await;
    let customer_id = CustomerId::new();

    h.services
        .approvals
        .request_enrollment(customer_id, h.business_id, program_id)
        .await
        .expect("first invite");

    let err = h
        .services
        .approvals
        .request_enrollment(customer_id, h.business_id, program_id)
        .await
        .expect_err("second invite must conflict");
    assert_eq!(err.kind, ErrorKind::AlreadyPending);
}

#[tokio::test]
async fn enrolling_twice_conflicts() {
    let h = harness();
    let program_id = h.seed_program(false).await;
    let customer_id = h.enroll_active(program_id).await;

    let err = h
        .services
        .approvals
        .request_enrollment(customer_id, h.business_id, program_id)
        .await
        .expect_err("second enrollment must conflict");
    assert_eq!(err.kind, ErrorKind::AlreadyEnrolled);
}

#[tokio::test]
async fn stale_pending_invite_is_replaced() {
    let h = harness_with_config(ApprovalsConfig { expiry_days: 0 });
    let program_id = h.seed_program(true).await;
    let customer_id = CustomerId::new();

    // First invite expires immediately, leaving a stale PENDING row.
    h.services
        .approvals
        .request_enrollment(customer_id, h.business_id, program_id)
        .await
        .expect("first invite");

    let outcome = h
        .services
        .approvals
        .request_enrollment(customer_id, h.business_id, program_id)
        .await
        .expect("replacement invite");
    assert!(matches!(outcome, EnrollmentOutcome::InvitePending { .. }));
}

#[tokio::test]
async fn deactivated_enrollment_reactivates_on_request() {
    let h = harness();
    let program_id = h.seed_program(false).await;
    let customer_id = h.enroll_active(program_id).await;

    h.services
        .points
        .award_points(customer_id, h.business_id, program_id, 300)
        .await
        .expect("award");
    h.services
        .enrollments
        .deactivate(customer_id, program_id)
        .await
        .expect("deactivate");

    let outcome = h
        .services
        .approvals
        .request_enrollment(customer_id, h.business_id, program_id)
        .await
        .expect("reactivation");
    let (enrollment, card) = match outcome {
        EnrollmentOutcome::Enrolled { enrollment, card } => (enrollment, card),
        other => panic!("expected reactivation, got {other:?}"),
    };
    assert_eq!(enrollment.status, EnrollmentStatus::Active);
    // Balance and card survive the inactive period.
    assert_eq!(enrollment.current_points, 300);
    assert_eq!(card.points, 300);
}

#[tokio::test]
async fn approved_deduction_debits_balance() {
    let h = harness();
    let program_id = h.seed_program(false).await;
    let customer_id = h.enroll_active(program_id).await;

    h.services
        .points
        .award_points(customer_id, h.business_id, program_id, 500)
        .await
        .expect("award");

    let request = h
        .services
        .approvals
        .request_points_deduction(
            customer_id,
            h.business_id,
            program_id,
            200,
            Some("Returned purchase".to_string()),
        )
        .await
        .expect("deduction request");

    let resolution = h
        .services
        .approvals
        .respond(request.id, customer_id, true)
        .await
        .expect("approve deduction");
    match resolution {
        ApprovalResolution::DeductionApplied { balance } => assert_eq!(balance, 300),
        other => panic!("expected applied deduction, got {other:?}"),
    }

    // Both parties get a persisted outcome row.
    assert_eq!(
        h.notification_count(customer_id.into_uuid(), NotificationKind::PointsDeducted)
            .await,
        1
    );
    assert_eq!(
        h.notification_count(h.business_id.into_uuid(), NotificationKind::PointsDeducted)
            .await,
        1
    );
}

#[tokio::test]
async fn rejected_deduction_notifies_both_parties() {
    let h = harness();
    let program_id = h.seed_program(false).await;
    let customer_id = h.enroll_active(program_id).await;

    h.services
        .points
        .award_points(customer_id, h.business_id, program_id, 500)
        .await
        .expect("award");

    let request = h
        .services
        .approvals
        .request_points_deduction(customer_id, h.business_id, program_id, 200, None)
        .await
        .expect("deduction request");

    let resolution = h
        .services
        .approvals
        .respond(request.id, customer_id, false)
        .await
        .expect("reject deduction");
    assert!(matches!(resolution, ApprovalResolution::DeductionRejected));

    let enrollment = h
        .services
        .enrollments
        .enrollment(customer_id, program_id)
        .await
        .expect("fetch enrollment")
        .expect("row exists");
    assert_eq!(enrollment.current_points, 500, "balance untouched");

    for recipient_id in [customer_id.into_uuid(), h.business_id.into_uuid()] {
        assert_eq!(
            h.notification_count(recipient_id, NotificationKind::PointsDeductionRejected)
                .await,
            1
        );
    }
}

#[tokio::test]
async fn expiry_sweep_flips_overdue_requests() {
    let h = harness_with_config(ApprovalsConfig { expiry_days: 0 });
    let program_id = h.seed_program(true).await;
    let customer_id = CustomerId::new();

    let outcome = h
        .services
        .approvals
        .request_enrollment(customer_id, h.business_id, program_id)
        .await
        .expect("invite");
    let request = match outcome {
        EnrollmentOutcome::InvitePending { request } => request,
        other => panic!("expected pending invite, got {other:?}"),
    };

    let flipped = h
        .services
        .approvals
        .expire_overdue()
        .await
        .expect("sweep");
    assert_eq!(flipped, 1);

    let stored = h
        .store
        .find(request.id)
        .await
        .expect("fetch request")
        .expect("request kept");
    assert_eq!(stored.status, ApprovalStatus::Expired);
}

#[tokio::test]
async fn removing_program_drops_enrollments_and_notifies() {
    let h = harness();
    let program_id = h.seed_program(false).await;
    let first = h.enroll_active(program_id).await;
    let second = h.enroll_active(program_id).await;

    let removed = h
        .services
        .enrollments
        .remove_program(program_id)
        .await
        .expect("remove program");
    assert_eq!(removed, 2);

    for customer_id in [first, second] {
        assert!(h
            .services
            .enrollments
            .enrollment(customer_id, program_id)
            .await
            .expect("fetch enrollment")
            .is_none());
        assert_eq!(
            h.notification_count(customer_id.into_uuid(), NotificationKind::ProgramRemoved)
                .await,
            1
        );
    }
}

#[tokio::test]
async fn inbox_read_state_tracks_per_recipient() {
    let h = harness();
    let program_id = h.seed_program(false).await;
    let customer_id = h.enroll_active(program_id).await;

    h.services
        .points
        .award_points(customer_id, h.business_id, program_id, 50)
        .await
        .expect("award");

    let recipient = customer_id.into_uuid();
    let unread = h
        .services
        .notifications
        .unread_count(recipient)
        .await
        .expect("unread count");
    assert!(unread >= 2, "acceptance and award notifications");

    let page = h
        .services
        .notifications
        .list(recipient, PageRequest::new(1, 10))
        .await
        .expect("list");
    let first_id = page.items[0].id;
    h.services
        .notifications
        .mark_read(recipient, first_id)
        .await
        .expect("mark read");
    assert_eq!(
        h.services
            .notifications
            .unread_count(recipient)
            .await
            .expect("unread count"),
        unread - 1
    );

    h.services
        .notifications
        .mark_all_read(recipient)
        .await
        .expect("mark all read");
    assert_eq!(
        h.services
            .notifications
            .unread_count(recipient)
            .await
            .expect("unread count"),
        0
    );
}
