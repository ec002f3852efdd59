//! In-process store double.
//!
//! Backs the workflow tests and local development without PostgreSQL.
//! The whole state sits behind one mutex, so every trait method is as
//! atomic as the postgres adapter's transactions: conditional updates
//! observe and mutate state in a single critical section.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use perkhub_core::error::AppError;
use perkhub_core::result::AppResult;
use perkhub_core::types::{
    ApprovalRequestId, CardId, CustomerId, NotificationId, PageRequest, PageResponse, ProgramId,
    RewardId, TransactionId,
};
use perkhub_entity::approval::{ApprovalRequest, ApprovalStatus, NewApprovalRequest};
use perkhub_entity::card::{CardActivity, LoyaltyCard, Tier};
use perkhub_entity::enrollment::{Enrollment, EnrollmentStatus, NewEnrollment};
use perkhub_entity::ledger::{NewPointTransaction, PointTransaction};
use perkhub_entity::notification::{NewNotification, Notification};
use perkhub_entity::program::{Program, Reward};

use crate::store::{
    ApprovalStore, CatalogStore, LedgerStore, LedgerUpdate, NotificationStore,
};

#[derive(Debug, Default)]
struct State {
    enrollments: HashMap<(CustomerId, ProgramId), Enrollment>,
    cards: HashMap<(CustomerId, ProgramId), LoyaltyCard>,
    transactions: Vec<PointTransaction>,
    activities: Vec<CardActivity>,
    requests: HashMap<ApprovalRequestId, ApprovalRequest>,
    notifications: Vec<Notification>,
    programs: HashMap<ProgramId, Program>,
    rewards: HashMap<RewardId, Reward>,
}

/// In-memory implementation of all four store traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means a test assertion fired mid-write;
        // recover the guard rather than cascading panics.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn paginate<T: serde::Serialize + Clone>(items: Vec<T>, page: &PageRequest) -> PageResponse<T> {
    let total = items.len() as u64;
    let page_items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    PageResponse::new(page_items, page.page, page.page_size, total)
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn find_enrollment(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<Option<Enrollment>> {
        Ok(self.state().enrollments.get(&(customer_id, program_id)).cloned())
    }

    async fn create_enrollment(&self, new: &NewEnrollment) -> AppResult<Enrollment> {
        let mut state = self.state();
        let key = (new.customer_id, new.program_id);
        if state.enrollments.contains_key(&key) {
            return Err(AppError::already_enrolled(
                "Customer already has an enrollment for this program",
            ));
        }
        let now = Utc::now();
        let enrollment = Enrollment {
            customer_id: new.customer_id,
            program_id: new.program_id,
            business_id: new.business_id,
            status: new.status,
            current_points: 0,
            total_points_earned: 0,
            enrolled_at: now,
            updated_at: now,
        };
        state.enrollments.insert(key, enrollment.clone());
        Ok(enrollment)
    }

    async fn remove_unactivated_enrollment(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<bool> {
        let mut state = self.state();
        let key = (customer_id, program_id);
        match state.enrollments.get(&key) {
            Some(e)
                if matches!(
                    e.status,
                    EnrollmentStatus::Pending | EnrollmentStatus::Rejected
                ) =>
            {
                state.enrollments.remove(&key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_enrollment_status(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    ) -> AppResult<bool> {
        let mut state = self.state();
        match state.enrollments.get_mut(&(customer_id, program_id)) {
            Some(e) if e.status == from => {
                e.status = to;
                e.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn activate_with_card(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        card_number: &str,
    ) -> AppResult<LoyaltyCard> {
        let mut state = self.state();
        let key = (customer_id, program_id);
        let business_id = {
            let enrollment = state
                .enrollments
                .get_mut(&key)
                .ok_or_else(|| AppError::not_found("Enrollment not found"))?;
            match enrollment.status {
                EnrollmentStatus::Pending => {
                    enrollment.status = EnrollmentStatus::Active;
                    enrollment.updated_at = Utc::now();
                }
                EnrollmentStatus::Active => {}
                other => {
                    return Err(AppError::already_processed(format!(
                        "Enrollment cannot be activated from status {other}"
                    )));
                }
            }
            enrollment.business_id
        };

        if let Some(existing) = state.cards.get(&key) {
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let card = LoyaltyCard {
            id: CardId::new(),
            customer_id,
            business_id,
            program_id,
            card_number: card_number.to_string(),
            tier: Tier::Standard,
            points: 0,
            points_multiplier: Tier::Standard.multiplier(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.cards.insert(key, card.clone());
        Ok(card)
    }

    async fn apply_transaction(&self, new: &NewPointTransaction) -> AppResult<LedgerUpdate> {
        let delta = new.signed_points();
        let mut state = self.state();
        let key = (new.customer_id, new.program_id);

        let (balance, total_earned) = {
            let enrollment = match state.enrollments.get_mut(&key) {
                Some(e) if e.can_transact() => e,
                Some(e) => {
                    return Err(AppError::not_enrolled(format!(
                        "Enrollment is {} and cannot transact",
                        e.status
                    )));
                }
                None => {
                    return Err(AppError::not_enrolled(
                        "Customer is not enrolled in this program",
                    ));
                }
            };

            let balance = enrollment.current_points + delta;
            if balance < 0 {
                return Err(AppError::insufficient_points(format!(
                    "Balance {} is insufficient for a {} point debit",
                    enrollment.current_points, new.points
                )));
            }
            enrollment.current_points = balance;
            enrollment.total_points_earned += delta.max(0);
            enrollment.updated_at = Utc::now();
            (balance, enrollment.total_points_earned)
        };

        let card = state
            .cards
            .get_mut(&key)
            .ok_or_else(|| AppError::internal("Loyalty card missing for active enrollment"))?;
        let previous_tier = card.tier;
        card.points = balance;
        card.tier = Tier::for_points(balance);
        card.points_multiplier = card.tier.multiplier();
        card.updated_at = Utc::now();
        let card = card.clone();

        let transaction = PointTransaction {
            id: TransactionId::new(),
            customer_id: new.customer_id,
            business_id: new.business_id,
            program_id: new.program_id,
            points: delta,
            kind: new.kind,
            reward_id: new.reward_id,
            created_at: Utc::now(),
        };
        state.transactions.push(transaction.clone());

        Ok(LedgerUpdate {
            transaction,
            balance,
            total_earned,
            card,
            previous_tier,
        })
    }

    async fn transaction_history(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<PointTransaction>> {
        let state = self.state();
        let mut items: Vec<_> = state
            .transactions
            .iter()
            .filter(|t| t.customer_id == customer_id && t.program_id == program_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(items, page))
    }

    async fn find_card(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<Option<LoyaltyCard>> {
        Ok(self.state().cards.get(&(customer_id, program_id)).cloned())
    }

    async fn record_activity(&self, activity: &CardActivity) -> AppResult<()> {
        self.state().activities.push(activity.clone());
        Ok(())
    }

    async fn remove_program_enrollments(
        &self,
        program_id: ProgramId,
    ) -> AppResult<Vec<Enrollment>> {
        let mut state = self.state();
        let keys: Vec<_> = state
            .enrollments
            .keys()
            .filter(|(_, p)| *p == program_id)
            .copied()
            .collect();
        let mut removed = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(enrollment) = state.enrollments.remove(&key) {
                removed.push(enrollment);
            }
            if let Some(card) = state.cards.get_mut(&key) {
                card.is_active = false;
                card.updated_at = Utc::now();
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl ApprovalStore for MemoryStore {
    async fn create_with_notification(
        &self,
        notification: &NewNotification,
        request: &NewApprovalRequest,
    ) -> AppResult<(Notification, ApprovalRequest)> {
        let mut state = self.state();
        let now = Utc::now();

        let stored_notification = Notification {
            id: NotificationId::new(),
            recipient_id: notification.recipient_id,
            business_id: notification.business_id,
            kind: notification.kind,
            title: notification.title.clone(),
            message: notification.message.clone(),
            payload: Json(notification.payload.clone()),
            reference_id: Some(request.id.into_uuid()),
            requires_action: notification.requires_action,
            action_taken: false,
            is_read: false,
            created_at: now,
            read_at: None,
        };
        let stored_request = ApprovalRequest {
            id: request.id,
            notification_id: stored_notification.id,
            customer_id: request.customer_id,
            business_id: request.business_id,
            kind: request.kind,
            status: ApprovalStatus::Pending,
            payload: Json(request.payload.clone()),
            requested_at: now,
            responded_at: None,
            expires_at: request.expires_at,
        };
        state.notifications.push(stored_notification.clone());
        state.requests.insert(stored_request.id, stored_request.clone());
        Ok((stored_notification, stored_request))
    }

    async fn find(&self, id: ApprovalRequestId) -> AppResult<Option<ApprovalRequest>> {
        Ok(self.state().requests.get(&id).cloned())
    }

    async fn list_pending(
        &self,
        customer_id: CustomerId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ApprovalRequest>> {
        let state = self.state();
        let mut items: Vec<_> = state
            .requests
            .values()
            .filter(|r| r.customer_id == customer_id && r.is_actionable_at(now))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(items)
    }

    async fn has_live_enrollment_request(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let state = self.state();
        Ok(state.requests.values().any(|r| {
            r.customer_id == customer_id
                && r.is_actionable_at(now)
                && r.payload.0.program_id() == program_id
                && r.kind == perkhub_entity::approval::ApprovalKind::Enrollment
        }))
    }

    async fn resolve(
        &self,
        id: ApprovalRequestId,
        approved: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ApprovalRequest>> {
        let mut state = self.state();
        match state.requests.get_mut(&id) {
            Some(r) if r.status.is_pending() => {
                r.status = if approved {
                    ApprovalStatus::Approved
                } else {
                    ApprovalStatus::Rejected
                };
                r.responded_at = Some(now);
                Ok(Some(r.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state();
        let mut expired = 0;
        for r in state.requests.values_mut() {
            if r.status.is_pending() && r.is_expired_at(now) {
                r.status = ApprovalStatus::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create(&self, new: &NewNotification) -> AppResult<Notification> {
        let mut state = self.state();
        let notification = Notification {
            id: NotificationId::new(),
            recipient_id: new.recipient_id,
            business_id: new.business_id,
            kind: new.kind,
            title: new.title.clone(),
            message: new.message.clone(),
            payload: Json(new.payload.clone()),
            reference_id: new.reference_id,
            requires_action: new.requires_action,
            action_taken: false,
            is_read: false,
            created_at: Utc::now(),
            read_at: None,
        };
        state.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn find_by_recipient(
        &self,
        recipient_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let state = self.state();
        let mut items: Vec<_> = state
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(items, page))
    }

    async fn count_unread(&self, recipient_id: Uuid) -> AppResult<i64> {
        let state = self.state();
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_read(
        &self,
        id: NotificationId,
        recipient_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut state = self.state();
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.recipient_id == recipient_id && !n.is_read)
        {
            Some(n) => {
                n.is_read = true;
                n.read_at = Some(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, recipient_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state();
        let mut changed = 0;
        for n in state
            .notifications
            .iter_mut()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
        {
            n.is_read = true;
            n.read_at = Some(now);
            changed += 1;
        }
        Ok(changed)
    }

    async fn mark_action_taken(&self, id: NotificationId) -> AppResult<bool> {
        let mut state = self.state();
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.requires_action && !n.action_taken)
        {
            Some(n) => {
                n.action_taken = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state();
        let before = state.notifications.len();
        state.notifications.retain(|n| n.created_at >= cutoff);
        Ok((before - state.notifications.len()) as u64)
    }

    async fn trim_per_recipient(&self, keep: i64) -> AppResult<u64> {
        let mut state = self.state();
        let mut by_recipient: HashMap<Uuid, Vec<(DateTime<Utc>, NotificationId)>> = HashMap::new();
        for n in &state.notifications {
            by_recipient
                .entry(n.recipient_id)
                .or_default()
                .push((n.created_at, n.id));
        }
        let mut stale: Vec<NotificationId> = Vec::new();
        for entries in by_recipient.values_mut() {
            entries.sort_by(|a, b| b.0.cmp(&a.0));
            stale.extend(entries.iter().skip(keep as usize).map(|(_, id)| *id));
        }
        let before = state.notifications.len();
        state.notifications.retain(|n| !stale.contains(&n.id));
        Ok((before - state.notifications.len()) as u64)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_program(&self, id: ProgramId) -> AppResult<Option<Program>> {
        Ok(self.state().programs.get(&id).cloned())
    }

    async fn find_reward(&self, id: RewardId) -> AppResult<Option<Reward>> {
        Ok(self.state().rewards.get(&id).cloned())
    }

    async fn create_program(&self, program: &Program) -> AppResult<Program> {
        self.state().programs.insert(program.id, program.clone());
        Ok(program.clone())
    }

    async fn create_reward(&self, reward: &Reward) -> AppResult<Reward> {
        self.state().rewards.insert(reward.id, reward.clone());
        Ok(reward.clone())
    }

    async fn delete_program(&self, id: ProgramId) -> AppResult<bool> {
        Ok(self.state().programs.remove(&id).is_some())
    }
}
