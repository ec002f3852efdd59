//! PostgreSQL adapter for [`LedgerStore`].
//!
//! Balance mutations run inside a transaction with the enrollment row
//! locked `FOR UPDATE`, so the non-negative balance guard and the card
//! mirror can never race.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use perkhub_core::config::store::RetryConfig;
use perkhub_core::error::AppError;
use perkhub_core::result::AppResult;
use perkhub_core::types::{CustomerId, PageRequest, PageResponse, ProgramId};
use perkhub_entity::card::{CardActivity, LoyaltyCard, Tier};
use perkhub_entity::enrollment::{Enrollment, EnrollmentStatus, NewEnrollment};
use perkhub_entity::ledger::{NewPointTransaction, PointTransaction};

use crate::retry::with_read_retry;
use crate::store::{LedgerStore, LedgerUpdate};

use super::{is_unique_violation, storage_err};

const ENROLLMENT_COLUMNS: &str = "customer_id, program_id, business_id, status, \
     current_points, total_points_earned, enrolled_at, updated_at";

const CARD_COLUMNS: &str = "id, customer_id, business_id, program_id, card_number, \
     tier, points, points_multiplier, is_active, created_at, updated_at";

const TRANSACTION_COLUMNS: &str =
    "id, customer_id, business_id, program_id, points, kind, reward_id, created_at";

/// Direct sqlx implementation of [`LedgerStore`].
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
    retry: RetryConfig,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool, retry: RetryConfig) -> Self {
        Self { pool, retry }
    }

    async fn query_enrollment(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<Option<Enrollment>> {
        sqlx::query_as::<_, Enrollment>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM program_enrollments \
             WHERE customer_id = $1 AND program_id = $2"
        ))
        .bind(customer_id)
        .bind(program_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to fetch enrollment", e))
    }

    async fn query_card(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<Option<LoyaltyCard>> {
        sqlx::query_as::<_, LoyaltyCard>(&format!(
            "SELECT {CARD_COLUMNS} FROM loyalty_cards \
             WHERE customer_id = $1 AND program_id = $2"
        ))
        .bind(customer_id)
        .bind(program_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to fetch loyalty card", e))
    }

    async fn query_history(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<PointTransaction>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM point_transactions \
             WHERE customer_id = $1 AND program_id = $2",
        )
        .bind(customer_id)
        .bind(program_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to count transactions", e))?;

        let items = sqlx::query_as::<_, PointTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM point_transactions \
             WHERE customer_id = $1 AND program_id = $2 \
             ORDER BY created_at DESC \
             LIMIT $3 OFFSET $4"
        ))
        .bind(customer_id)
        .bind(program_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to fetch transaction history", e))?;

        Ok(PageResponse::new(items, page.page, page.page_size, total as u64))
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn find_enrollment(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<Option<Enrollment>> {
        with_read_retry(&self.retry, "ledger.find_enrollment", || {
            self.query_enrollment(customer_id, program_id)
        })
        .await
    }

    async fn create_enrollment(&self, new: &NewEnrollment) -> AppResult<Enrollment> {
        sqlx::query_as::<_, Enrollment>(&format!(
            "INSERT INTO program_enrollments \
             (customer_id, program_id, business_id, status) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(new.customer_id)
        .bind(new.program_id)
        .bind(new.business_id)
        .bind(new.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::already_enrolled("Customer already has an enrollment for this program")
            } else {
                storage_err("Failed to create enrollment", e)
            }
        })
    }

    async fn remove_unactivated_enrollment(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM program_enrollments \
             WHERE customer_id = $1 AND program_id = $2 \
               AND status IN ('pending', 'rejected')",
        )
        .bind(customer_id)
        .bind(program_id)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to remove unactivated enrollment", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_enrollment_status(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE program_enrollments \
             SET status = $3, updated_at = NOW() \
             WHERE customer_id = $1 AND program_id = $2 AND status = $4",
        )
        .bind(customer_id)
        .bind(program_id)
        .bind(to)
        .bind(from)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to update enrollment status", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn activate_with_card(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        card_number: &str,
    ) -> AppResult<LoyaltyCard> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_err("Failed to begin transaction", e))?;

        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM program_enrollments \
             WHERE customer_id = $1 AND program_id = $2 \
             FOR UPDATE"
        ))
        .bind(customer_id)
        .bind(program_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| storage_err("Failed to fetch enrollment", e))?
        .ok_or_else(|| AppError::not_found("Enrollment not found"))?;

        match enrollment.status {
            EnrollmentStatus::Pending => {
                sqlx::query(
                    "UPDATE program_enrollments \
                     SET status = 'active', updated_at = NOW() \
                     WHERE customer_id = $1 AND program_id = $2",
                )
                .bind(customer_id)
                .bind(program_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| storage_err("Failed to activate enrollment", e))?;
            }
            // Re-running activation against an active enrollment is a no-op.
            EnrollmentStatus::Active => {}
            other => {
                return Err(AppError::already_processed(format!(
                    "Enrollment cannot be activated from status {other}"
                )));
            }
        }

        // ON CONFLICT DO NOTHING keeps card issuance idempotent; the
        // follow-up select returns the surviving row either way.
        sqlx::query(
            "INSERT INTO loyalty_cards \
             (id, customer_id, business_id, program_id, card_number, tier, points, points_multiplier) \
             VALUES ($1, $2, $3, $4, $5, $6, 0, $7) \
             ON CONFLICT (customer_id, program_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(customer_id)
        .bind(enrollment.business_id)
        .bind(program_id)
        .bind(card_number)
        .bind(Tier::Standard)
        .bind(Tier::Standard.multiplier())
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_err("Failed to issue loyalty card", e))?;

        let card = sqlx::query_as::<_, LoyaltyCard>(&format!(
            "SELECT {CARD_COLUMNS} FROM loyalty_cards \
             WHERE customer_id = $1 AND program_id = $2"
        ))
        .bind(customer_id)
        .bind(program_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| storage_err("Failed to fetch loyalty card", e))?;

        tx.commit()
            .await
            .map_err(|e| storage_err("Failed to commit transaction", e))?;

        Ok(card)
    }

    async fn apply_transaction(&self, new: &NewPointTransaction) -> AppResult<LedgerUpdate> {
        let delta = new.signed_points();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_err("Failed to begin transaction", e))?;

        // Row lock serializes concurrent mutations of the same balance.
        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM program_enrollments \
             WHERE customer_id = $1 AND program_id = $2 \
             FOR UPDATE"
        ))
        .bind(new.customer_id)
        .bind(new.program_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| storage_err("Failed to fetch enrollment", e))?;

        let enrollment = match enrollment {
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
        let total_earned = enrollment.total_points_earned + delta.max(0);

        sqlx::query(
            "UPDATE program_enrollments \
             SET current_points = $3, total_points_earned = $4, updated_at = NOW() \
             WHERE customer_id = $1 AND program_id = $2",
        )
        .bind(new.customer_id)
        .bind(new.program_id)
        .bind(balance)
        .bind(total_earned)
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_err("Failed to update enrollment balance", e))?;

        let previous = sqlx::query_as::<_, LoyaltyCard>(&format!(
            "SELECT {CARD_COLUMNS} FROM loyalty_cards \
             WHERE customer_id = $1 AND program_id = $2 \
             FOR UPDATE"
        ))
        .bind(new.customer_id)
        .bind(new.program_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| storage_err("Failed to fetch loyalty card", e))?
        .ok_or_else(|| {
            AppError::internal("Loyalty card missing for active enrollment")
        })?;

        let tier = Tier::for_points(balance);
        let card = sqlx::query_as::<_, LoyaltyCard>(&format!(
            "UPDATE loyalty_cards \
             SET points = $3, tier = $4, points_multiplier = $5, updated_at = NOW() \
             WHERE customer_id = $1 AND program_id = $2 \
             RETURNING {CARD_COLUMNS}"
        ))
        .bind(new.customer_id)
        .bind(new.program_id)
        .bind(balance)
        .bind(tier)
        .bind(tier.multiplier())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| storage_err("Failed to update loyalty card", e))?;

        let transaction = sqlx::query_as::<_, PointTransaction>(&format!(
            "INSERT INTO point_transactions \
             (id, customer_id, business_id, program_id, points, kind, reward_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.customer_id)
        .bind(new.business_id)
        .bind(new.program_id)
        .bind(delta)
        .bind(new.kind)
        .bind(new.reward_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| storage_err("Failed to append ledger entry", e))?;

        tx.commit()
            .await
            .map_err(|e| storage_err("Failed to commit transaction", e))?;

        Ok(LedgerUpdate {
            transaction,
            balance,
            total_earned,
            previous_tier: previous.tier,
            card,
        })
    }

    async fn transaction_history(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<PointTransaction>> {
        with_read_retry(&self.retry, "ledger.transaction_history", || {
            self.query_history(customer_id, program_id, page)
        })
        .await
    }

    async fn find_card(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<Option<LoyaltyCard>> {
        with_read_retry(&self.retry, "ledger.find_card", || {
            self.query_card(customer_id, program_id)
        })
        .await
    }

    async fn record_activity(&self, activity: &CardActivity) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO card_activities \
             (id, card_id, customer_id, program_id, kind, from_tier, to_tier, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(activity.id)
        .bind(activity.card_id)
        .bind(activity.customer_id)
        .bind(activity.program_id)
        .bind(activity.kind)
        .bind(activity.from_tier)
        .bind(activity.to_tier)
        .bind(activity.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to record card activity", e))?;

        Ok(())
    }

    async fn remove_program_enrollments(
        &self,
        program_id: ProgramId,
    ) -> AppResult<Vec<Enrollment>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_err("Failed to begin transaction", e))?;

        let removed = sqlx::query_as::<_, Enrollment>(&format!(
            "DELETE FROM program_enrollments WHERE program_id = $1 \
             RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(program_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| storage_err("Failed to remove program enrollments", e))?;

        sqlx::query("UPDATE loyalty_cards SET is_active = FALSE, updated_at = NOW() WHERE program_id = $1")
            .bind(program_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_err("Failed to deactivate program cards", e))?;

        tx.commit()
            .await
            .map_err(|e| storage_err("Failed to commit transaction", e))?;

        Ok(removed)
    }
}
