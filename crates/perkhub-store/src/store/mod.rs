//! Swappable store traits.
//!
//! The workflow services depend on these traits only; which adapter
//! backs them is a deployment decision made at startup. The postgres
//! adapter is the default, the remote adapter proxies the ledger to a
//! REST service, and the memory adapter is an in-process double used by
//! the workflow tests.
//!
//! Atomicity contracts live here, not in the adapters: every method
//! documents what must happen in a single atomic step, and all three
//! adapters honour the same contract.

pub mod memory;
pub mod postgres;
pub mod remote;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use perkhub_core::result::AppResult;
use perkhub_core::types::{
    ApprovalRequestId, CustomerId, NotificationId, PageRequest, PageResponse, ProgramId, RewardId,
};
use perkhub_entity::approval::{ApprovalRequest, NewApprovalRequest};
use perkhub_entity::card::{CardActivity, LoyaltyCard, Tier};
use perkhub_entity::enrollment::{Enrollment, EnrollmentStatus, NewEnrollment};
use perkhub_entity::ledger::{NewPointTransaction, PointTransaction};
use perkhub_entity::notification::{NewNotification, Notification};
use perkhub_entity::program::{Program, Reward};

/// Result of atomically applying a point transaction.
///
/// Carries everything the caller needs to finish the workflow without a
/// second read: the appended ledger entry, the updated card, and the
/// tier the card held before the update.
#[derive(Debug, Clone)]
pub struct LedgerUpdate {
    /// The ledger entry that was appended.
    pub transaction: PointTransaction,
    /// Enrollment balance after the update.
    pub balance: i64,
    /// Lifetime earned total after the update.
    pub total_earned: i64,
    /// The loyalty card after the balance mirror and tier recalculation.
    pub card: LoyaltyCard,
    /// Tier the card held before this transaction.
    pub previous_tier: Tier,
}

impl LedgerUpdate {
    /// Whether this update moved the card to a different tier.
    pub fn tier_changed(&self) -> bool {
        self.previous_tier != self.card.tier
    }
}

/// Persistence for enrollments, loyalty cards, and the point ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    /// Fetch the enrollment row for a customer/program pair, if any.
    async fn find_enrollment(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<Option<Enrollment>>;

    /// Insert a new enrollment row.
    ///
    /// A duplicate customer/program pair fails with `ALREADY_ENROLLED`;
    /// the unique constraint is the arbiter under concurrency.
    async fn create_enrollment(&self, new: &NewEnrollment) -> AppResult<Enrollment>;

    /// Delete an enrollment row that never activated (`PENDING` or
    /// `REJECTED`), returning the relationship to NONE. Serves both the
    /// invite-rejection path and stale-invite replacement.
    ///
    /// Returns `false` when the row was absent, `ACTIVE`, or `INACTIVE`.
    async fn remove_unactivated_enrollment(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<bool>;

    /// Conditionally move an enrollment from one status to another in a
    /// single statement. Returns `false` when the row was not in the
    /// expected `from` status.
    async fn set_enrollment_status(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    ) -> AppResult<bool>;

    /// Activate an enrollment and ensure its loyalty card exists, in one
    /// transaction.
    ///
    /// A `PENDING` enrollment becomes `ACTIVE`; an already-`ACTIVE`
    /// enrollment is left alone so the operation is safe to repeat. The
    /// card insert is idempotent on the customer/program pair: when a
    /// card already exists it is returned unchanged and `card_number` is
    /// ignored.
    async fn activate_with_card(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        card_number: &str,
    ) -> AppResult<LoyaltyCard>;

    /// Append a ledger entry and update the enrollment balance and card
    /// mirror atomically.
    ///
    /// Fails with `NOT_ENROLLED` when there is no `ACTIVE` enrollment
    /// and with `INSUFFICIENT_POINTS` when a debit would take the
    /// balance below zero. On failure nothing is written.
    async fn apply_transaction(&self, tx: &NewPointTransaction) -> AppResult<LedgerUpdate>;

    /// The customer's ledger history for one program, newest first.
    async fn transaction_history(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<PointTransaction>>;

    /// Fetch the loyalty card for a customer/program pair, if any.
    async fn find_card(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<Option<LoyaltyCard>>;

    /// Record a card activity entry (tier changes).
    async fn record_activity(&self, activity: &CardActivity) -> AppResult<()>;

    /// Remove every enrollment and card under a program, returning the
    /// enrollments that were removed so the caller can notify their
    /// owners. Ledger history is retained.
    async fn remove_program_enrollments(&self, program_id: ProgramId)
        -> AppResult<Vec<Enrollment>>;
}

/// Persistence for customer approval requests.
#[async_trait]
pub trait ApprovalStore: Send + Sync + 'static {
    /// Persist a notification and its linked approval request in one
    /// transaction, so a customer never sees an actionable notification
    /// whose request is missing.
    async fn create_with_notification(
        &self,
        notification: &NewNotification,
        request: &NewApprovalRequest,
    ) -> AppResult<(Notification, ApprovalRequest)>;

    /// Fetch an approval request by id.
    async fn find(&self, id: ApprovalRequestId) -> AppResult<Option<ApprovalRequest>>;

    /// The customer's pending, unexpired requests, newest first.
    async fn list_pending(
        &self,
        customer_id: CustomerId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ApprovalRequest>>;

    /// Whether the customer has a live (pending, unexpired) enrollment
    /// request for the given program.
    async fn has_live_enrollment_request(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Resolve a request to `APPROVED` or `REJECTED`, only if it is
    /// still `PENDING`. Returns the resolved row, or `None` when the
    /// request had already left `PENDING` — under a concurrent double
    /// response exactly one caller gets the row.
    async fn resolve(
        &self,
        id: ApprovalRequestId,
        approved: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ApprovalRequest>>;

    /// Flip every `PENDING` request whose deadline has passed to
    /// `EXPIRED`. Returns how many rows changed.
    async fn expire_overdue(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Persistence for the notification inbox.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Insert a notification row.
    async fn create(&self, new: &NewNotification) -> AppResult<Notification>;

    /// A recipient's notifications, newest first.
    async fn find_by_recipient(
        &self,
        recipient_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>>;

    /// Count a recipient's unread notifications.
    async fn count_unread(&self, recipient_id: Uuid) -> AppResult<i64>;

    /// Mark one notification read. Scoped to the recipient so nobody
    /// can touch another inbox. Returns `false` when nothing matched.
    async fn mark_read(
        &self,
        id: NotificationId,
        recipient_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Mark all of a recipient's notifications read. Returns how many
    /// rows changed.
    async fn mark_all_read(&self, recipient_id: Uuid, now: DateTime<Utc>) -> AppResult<u64>;

    /// Record that the action behind an actionable notification has
    /// been taken, so clients can stop rendering the buttons.
    async fn mark_action_taken(&self, id: NotificationId) -> AppResult<bool>;

    /// Delete notifications created before the cutoff. Returns how many
    /// rows were deleted.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;

    /// Keep only the newest `keep` notifications per recipient, deleting
    /// the rest. Returns how many rows were deleted.
    async fn trim_per_recipient(&self, keep: i64) -> AppResult<u64>;
}

/// Read access to the program and reward catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    /// Fetch a program by id.
    async fn find_program(&self, id: ProgramId) -> AppResult<Option<Program>>;

    /// Fetch a reward by id.
    async fn find_reward(&self, id: RewardId) -> AppResult<Option<Reward>>;

    /// Insert a program definition.
    async fn create_program(&self, program: &Program) -> AppResult<Program>;

    /// Insert a reward definition.
    async fn create_reward(&self, reward: &Reward) -> AppResult<Reward>;

    /// Delete a program definition. Returns `false` when it was absent.
    async fn delete_program(&self, id: ProgramId) -> AppResult<bool>;
}
