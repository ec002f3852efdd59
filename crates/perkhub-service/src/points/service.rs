//! Awarding, redeeming, and deducting points.
//!
//! Every balance mutation goes through the store's `apply_transaction`,
//! which appends the ledger entry, updates the enrollment balance, and
//! recalculates the card mirror and tier in one atomic step. This
//! service adds the policy around it: the strict no-auto-enroll award
//! check, reward validation, and the notifications and events that
//! follow a successful mutation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use perkhub_core::error::AppError;
use perkhub_core::events::{DomainEvent, EventPayload, PointsEvent};
use perkhub_core::result::AppResult;
use perkhub_core::traits::EventSink;
use perkhub_core::types::{BusinessId, CustomerId, PageRequest, PageResponse, ProgramId, RewardId};
use perkhub_entity::card::{CardActivity, CardActivityKind};
use perkhub_entity::ledger::{NewPointTransaction, PointTransaction, TransactionKind};
use perkhub_entity::notification::{NewNotification, NotificationKind, NotificationPayload};
use perkhub_store::{CatalogStore, LedgerStore, LedgerUpdate};

use crate::notification::NotificationService;

/// Processes point transactions against active enrollments.
#[derive(Clone)]
pub struct PointsService {
    /// Ledger store.
    ledger: Arc<dyn LedgerStore>,
    /// Program catalog, for reward lookups.
    catalog: Arc<dyn CatalogStore>,
    /// Notification inbox.
    notifications: Arc<NotificationService>,
    /// Live event fan-out.
    events: Arc<dyn EventSink>,
}

impl PointsService {
    /// Creates a new points service.
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

    /// Award points to a customer's enrollment.
    ///
    /// The enrollment must already be ACTIVE; awarding never creates or
    /// activates one. Fails `NOT_ENROLLED` otherwise, with no side
    /// effects.
    pub async fn award_points(
        &self,
        customer_id: CustomerId,
        business_id: BusinessId,
        program_id: ProgramId,
        points: i64,
    ) -> AppResult<LedgerUpdate> {
        if points <= 0 {
            return Err(AppError::invalid_parameters(
                "Award points must be positive",
            ));
        }

        let update = self
            .ledger
            .apply_transaction(&NewPointTransaction {
                customer_id,
                business_id,
                program_id,
                points,
                kind: TransactionKind::Award,
                reward_id: None,
            })
            .await?;

        self.record_outcome(
            customer_id,
            business_id,
            program_id,
            &update,
            NotificationKind::PointsAwarded,
            "Points awarded",
            format!("You earned {points} points"),
            PointsEvent::Awarded {
                customer_id: customer_id.into_uuid(),
                program_id: program_id.into_uuid(),
                points,
                balance: update.balance,
            },
        )
        .await;

        info!(
            customer_id = %customer_id,
            program_id = %program_id,
            points,
            balance = update.balance,
            "Points awarded"
        );
        Ok(update)
    }

    /// Redeem a reward against a customer's balance.
    ///
    /// A `points_required` of zero is a valid benefit-only redemption;
    /// a balance below the cost fails `INSUFFICIENT_POINTS` and writes
    /// nothing.
    pub async fn redeem_reward(
        &self,
        customer_id: CustomerId,
        business_id: BusinessId,
        program_id: ProgramId,
        reward_id: RewardId,
    ) -> AppResult<LedgerUpdate> {
        let reward = self
            .catalog
            .find_reward(reward_id)
            .await?
            .ok_or_else(|| AppError::not_found("Reward not found"))?;
        if reward.program_id != program_id {
            return Err(AppError::invalid_parameters(
                "Reward does not belong to this program",
            ));
        }
        if !reward.is_active {
            return Err(AppError::invalid_parameters("Reward is not active"));
        }

        let update = self
            .ledger
            .apply_transaction(&NewPointTransaction {
                customer_id,
                business_id,
                program_id,
                points: reward.points_required,
                kind: TransactionKind::Redeem,
                reward_id: Some(reward_id),
            })
            .await?;

        self.record_outcome(
            customer_id,
            business_id,
            program_id,
            &update,
            NotificationKind::RewardRedeemed,
            "Reward redeemed",
            format!("You redeemed {}", reward.name),
            PointsEvent::Redeemed {
                customer_id: customer_id.into_uuid(),
                program_id: program_id.into_uuid(),
                reward_id: reward_id.into_uuid(),
                points: reward.points_required,
                balance: update.balance,
            },
        )
        .await;

        info!(
            customer_id = %customer_id,
            program_id = %program_id,
            reward_id = %reward_id,
            points = reward.points_required,
            balance = update.balance,
            "Reward redeemed"
        );
        Ok(update)
    }

    /// Apply an approved points deduction.
    pub(crate) async fn apply_deduction(
        &self,
        customer_id: CustomerId,
        business_id: BusinessId,
        program_id: ProgramId,
        points: i64,
        reason: Option<String>,
    ) -> AppResult<LedgerUpdate> {
        let update = self
            .ledger
            .apply_transaction(&NewPointTransaction {
                customer_id,
                business_id,
                program_id,
                points,
                kind: TransactionKind::Redeem,
                reward_id: None,
            })
            .await?;

        let message = match reason {
            Some(reason) => format!("{points} points were deducted: {reason}"),
            None => format!("{points} points were deducted"),
        };
        self.record_outcome(
            customer_id,
            business_id,
            program_id,
            &update,
            NotificationKind::PointsDeducted,
            "Points deducted",
            message,
            PointsEvent::Deducted {
                customer_id: customer_id.into_uuid(),
                program_id: program_id.into_uuid(),
                points,
                balance: update.balance,
            },
        )
        .await;

        info!(
            customer_id = %customer_id,
            program_id = %program_id,
            points,
            balance = update.balance,
            "Approved deduction applied"
        );
        Ok(update)
    }

    /// The customer's ledger history for one program, newest first.
    pub async fn history(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        page: PageRequest,
    ) -> AppResult<PageResponse<PointTransaction>> {
        self.ledger
            .transaction_history(customer_id, program_id, &page)
            .await
    }

    /// Record the notification, live event, and any tier-change activity
    /// that follow a committed transaction. All best-effort: the ledger
    /// write already stands.
    #[allow(clippy::too_many_arguments)]
    async fn record_outcome(
        &self,
        customer_id: CustomerId,
        business_id: BusinessId,
        program_id: ProgramId,
        update: &LedgerUpdate,
        kind: NotificationKind,
        title: &str,
        message: String,
        event: PointsEvent,
    ) {
        let result = self
            .notifications
            .notify(NewNotification {
                recipient_id: customer_id.into_uuid(),
                business_id,
                kind,
                title: title.to_string(),
                message,
                payload: NotificationPayload::Points {
                    program_id,
                    points: update.transaction.points,
                    balance: update.balance,
                    reward_id: update.transaction.reward_id,
                },
                reference_id: Some(update.transaction.id.into_uuid()),
                requires_action: false,
            })
            .await;
        if let Err(e) = result {
            warn!(customer_id = %customer_id, error = %e, "Failed to record points notification");
        }

        self.emit(customer_id.into_uuid(), event).await;

        if update.tier_changed() {
            self.record_tier_change(customer_id, business_id, program_id, update)
                .await;
        }
    }

    async fn record_tier_change(
        &self,
        customer_id: CustomerId,
        business_id: BusinessId,
        program_id: ProgramId,
        update: &LedgerUpdate,
    ) {
        let from = update.previous_tier;
        let to = update.card.tier;

        let activity = CardActivity {
            id: Uuid::new_v4(),
            card_id: update.card.id,
            customer_id,
            program_id,
            kind: CardActivityKind::TierChange,
            from_tier: Some(from),
            to_tier: Some(to),
            created_at: Utc::now(),
        };
        if let Err(e) = self.ledger.record_activity(&activity).await {
            warn!(customer_id = %customer_id, error = %e, "Failed to record tier-change activity");
        }

        let result = self
            .notifications
            .notify(NewNotification {
                recipient_id: customer_id.into_uuid(),
                business_id,
                kind: NotificationKind::TierChanged,
                title: "Tier changed".to_string(),
                message: format!("Your card moved from {from} to {to}"),
                payload: NotificationPayload::Tier {
                    program_id,
                    from: from.to_string(),
                    to: to.to_string(),
                },
                reference_id: Some(update.card.id.into_uuid()),
                requires_action: false,
            })
            .await;
        if let Err(e) = result {
            warn!(customer_id = %customer_id, error = %e, "Failed to record tier notification");
        }

        self.emit(
            customer_id.into_uuid(),
            PointsEvent::TierChanged {
                customer_id: customer_id.into_uuid(),
                program_id: program_id.into_uuid(),
                from: from.to_string(),
                to: to.to_string(),
            },
        )
        .await;

        info!(
            customer_id = %customer_id,
            program_id = %program_id,
            from = %from,
            to = %to,
            "Card tier changed"
        );
    }

    async fn emit(&self, recipient_id: Uuid, event: PointsEvent) {
        let event = DomainEvent::new(None, EventPayload::Points(event));
        self.events.emit(recipient_id, &event).await;
    }
}
