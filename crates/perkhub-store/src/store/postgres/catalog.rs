//! PostgreSQL adapter for [`CatalogStore`].

use async_trait::async_trait;
use sqlx::PgPool;

use perkhub_core::config::store::RetryConfig;
use perkhub_core::result::AppResult;
use perkhub_core::types::{ProgramId, RewardId};
use perkhub_entity::program::{Program, Reward};

use crate::retry::with_read_retry;
use crate::store::CatalogStore;

use super::storage_err;

const PROGRAM_COLUMNS: &str = "id, business_id, name, requires_approval, is_active, created_at";

const REWARD_COLUMNS: &str = "id, program_id, name, points_required, is_active, created_at";

/// Direct sqlx implementation of [`CatalogStore`].
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
    retry: RetryConfig,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool, retry: RetryConfig) -> Self {
        Self { pool, retry }
    }

    async fn query_program(&self, id: ProgramId) -> AppResult<Option<Program>> {
        sqlx::query_as::<_, Program>(&format!(
            "SELECT {PROGRAM_COLUMNS} FROM programs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to fetch program", e))
    }

    async fn query_reward(&self, id: RewardId) -> AppResult<Option<Reward>> {
        sqlx::query_as::<_, Reward>(&format!(
            "SELECT {REWARD_COLUMNS} FROM rewards WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to fetch reward", e))
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn find_program(&self, id: ProgramId) -> AppResult<Option<Program>> {
        with_read_retry(&self.retry, "catalog.find_program", || self.query_program(id)).await
    }

    async fn find_reward(&self, id: RewardId) -> AppResult<Option<Reward>> {
        with_read_retry(&self.retry, "catalog.find_reward", || self.query_reward(id)).await
    }

    async fn create_program(&self, program: &Program) -> AppResult<Program> {
        sqlx::query_as::<_, Program>(&format!(
            "INSERT INTO programs (id, business_id, name, requires_approval, is_active) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {PROGRAM_COLUMNS}"
        ))
        .bind(program.id)
        .bind(program.business_id)
        .bind(&program.name)
        .bind(program.requires_approval)
        .bind(program.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to create program", e))
    }

    async fn create_reward(&self, reward: &Reward) -> AppResult<Reward> {
        sqlx::query_as::<_, Reward>(&format!(
            "INSERT INTO rewards (id, program_id, name, points_required, is_active) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {REWARD_COLUMNS}"
        ))
        .bind(reward.id)
        .bind(reward.program_id)
        .bind(&reward.name)
        .bind(reward.points_required)
        .bind(reward.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_err("Failed to create reward", e))
    }

    async fn delete_program(&self, id: ProgramId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM programs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_err("Failed to delete program", e))?;

        Ok(result.rows_affected() > 0)
    }
}
